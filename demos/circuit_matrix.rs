use std::f64::consts::PI;
use qsim::{
    algebra,
    cache::SimCache,
    eval::evaluate_matrix_with,
    gates,
    schedule,
    Graph,
    Operator,
};

fn main() -> anyhow::Result<()> {
    // (H ⊗ R(π/4)) on two inputs, followed by CNOT
    let g = Graph::new();
    let (q0, g) = g.add_input(1)?;
    let (q1, g) = g.add_input(1)?;
    let (a, g) = g.add_apply(Operator::tensor(gates::h(), gates::r(PI / 4.0)), &[q0, q1])?;
    let (b, g) = g.add_apply(gates::cnot(), &[a])?;
    let sched = schedule(&g)?;
    println!("schedule: {:?}", sched.as_slice());

    let mut cache = SimCache::new();
    let mats = evaluate_matrix_with(&g, &sched, &mut cache)?;
    let u = mats.get(b).ok_or_else(|| anyhow::anyhow!("no result for node {}", b))?;
    println!("{:.4}", u);
    println!(
        "unitary: {}",
        algebra::approx_eq(
            &u.t().mapv(|z| z.conj()).dot(u),
            &algebra::identity(2)?,
            Some(1e-9),
        ),
    );
    println!("cache: {} entries, {} hits, {} misses", cache.len(), cache.hits(), cache.misses());
    Ok(())
}
