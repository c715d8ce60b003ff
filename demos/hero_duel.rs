//! A hero-led retinue shooting at a regenerating monster.
//!
//! Run with: `cargo run --example hero_duel`

use wardice::{
    rule, simulate, special, HeroProfile, Mode, ProfileError, UnitProfile, WeaponProfile,
};

fn main() -> Result<(), ProfileError> {
    let longbows = WeaponProfile::new("Longbows", 1)?
        .with_ranged(true)
        .with_rules([rule(special::Crack)]);
    let greatbow = WeaponProfile::new("Greatbow", 2)?
        .with_ranged(true)
        .with_armor_penetration(2);
    let captain = HeroProfile::new("Warden Captain", 3, 4, 2, 1)?
        .with_weapons([greatbow])
        .with_auras([rule(special::Precise)]);
    let wardens = UnitProfile::new("Forest Wardens", 4, 5, 1, 0, 8)?
        .with_weapons([longbows])
        .with_hero(captain);

    let hydra = UnitProfile::new("Marsh Hydra", 4, 4, 9, 2, 1)?
        .with_rules([rule(special::Regeneration::new()), rule(special::Stealth)]);

    let report = simulate(&wardens, &hydra, Mode::Ranged);

    println!("{} loose arrows at the {}", wardens.name(), hydra.name());
    println!(
        "  expected wounds to the hydra: {:.3}",
        report.expected_wounds_to_b
    );
    println!(
        "  chance to drive it off: {:.2}%",
        report.win_probability_a * 100.0
    );
    println!(
        "  chance to slay it outright: {:.3}%",
        report.wipe_probability_b * 100.0
    );

    let json = serde_json::to_string_pretty(&report.outcomes)
        .unwrap_or_else(|_| String::from("[]"));
    println!("\nfull outcome distribution:\n{json}");
    Ok(())
}
