use qsim::{ algebra, Circuit, Label };

// prepare a Bell pair from ∣00⟩
//
// ∣0⟩ --H--*--
//          |     ∣00⟩ + ∣11⟩
// ∣0⟩ -----X--
//
fn main() -> anyhow::Result<()> {
    let mut circuit = Circuit::new(2);
    circuit.initialize_bits(&[0, 0])?;
    circuit.h().on([0])?;
    circuit.cnot().on([0, 1])?;
    let states = circuit.execute()?;
    let bell = &states[&Label::group([0, 1])];
    for (k, a) in bell.iter().enumerate() {
        println!("|{:02b}⟩: {:+.5}", k, a);
    }
    let expected =
        algebra::state_vector([
            std::f64::consts::FRAC_1_SQRT_2,
            0.0,
            0.0,
            std::f64::consts::FRAC_1_SQRT_2,
        ])?;
    println!("is bell pair: {}", algebra::approx_eq(bell, &expected, None));
    circuit.graph().save_graphviz("bell_pair", "bell_pair.gv")?;
    Ok(())
}
