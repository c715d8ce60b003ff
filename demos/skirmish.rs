//! A melee skirmish between two infantry blocks, printed as a report.
//!
//! Run with: `cargo run --example skirmish`

use wardice::{rule, simulate, special, Mode, ProfileError, UnitProfile, WeaponProfile};

fn main() -> Result<(), ProfileError> {
    let claws = WeaponProfile::new("Claws", 2)?
        .with_rules([rule(special::Furious), rule(special::Rending)]);
    let beasts = UnitProfile::new("Moon Beasts", 3, 5, 2, 1, 6)?.with_weapons([claws]);

    let spears = WeaponProfile::new("Spears", 1)?.with_rules([rule(special::Counter)]);
    let phalanx = UnitProfile::new("Iron Phalanx", 4, 3, 1, 0, 10)?
        .with_weapons([spears])
        .with_rules([rule(special::Shield)]);

    let report = simulate(&beasts, &phalanx, Mode::Melee);

    println!("{} charge {}", beasts.name(), phalanx.name());
    println!(
        "  expected wounds: {:.2} dealt, {:.2} taken",
        report.expected_wounds_to_b, report.expected_wounds_to_a
    );
    println!(
        "  expected models lost: {:.2} vs {:.2}",
        report.expected_models_lost_a, report.expected_models_lost_b
    );
    println!(
        "  win {:.1}% / tie {:.1}% / loss {:.1}%",
        report.win_probability_a * 100.0,
        report.tie_probability * 100.0,
        report.win_probability_b * 100.0
    );
    println!(
        "  wipe chance: {:.2}% for the beasts, {:.2}% for the phalanx",
        report.wipe_probability_a * 100.0,
        report.wipe_probability_b * 100.0
    );

    let json = serde_json::to_string_pretty(&report.outcomes)
        .unwrap_or_else(|_| String::from("[]"));
    println!("\nfull outcome distribution:\n{json}");
    Ok(())
}
