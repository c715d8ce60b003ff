//! End-to-end battle scenarios exercising the full pipeline.

use wardice::{
    rule, simulate, special::*, HeroProfile, Mode, UnitProfile, WeaponProfile,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn plain_unit(name: &str, quality: i32, defense: i32, models: i32) -> UnitProfile {
    UnitProfile::new(name, quality, defense, 1, 0, models).unwrap()
}

fn with_sword(unit: UnitProfile) -> UnitProfile {
    let sword = WeaponProfile::new("Sword", 1).unwrap();
    unit.with_weapons([sword])
}

#[test]
fn test_single_attack_into_unreachable_save() {
    // Quality 2 into defense 7: hit chance 5/6, unsaved chance 5/6.
    let blade = WeaponProfile::new("Blade", 1).unwrap();
    let duelist = plain_unit("Duelist", 2, 4, 1).with_weapons([blade]);
    let target = plain_unit("Target", 4, 7, 1);

    let report = simulate(&duelist, &target, Mode::Ranged);
    assert!(close(report.expected_wounds_to_b, 25.0 / 36.0));
}

#[test]
fn test_counter_strike_thins_the_chargers() {
    let chargers = with_sword(plain_unit("Chargers", 4, 4, 5));
    let spears = WeaponProfile::new("Spears", 1)
        .unwrap()
        .with_rules([rule(Counter)]);
    let phalanx = plain_unit("Phalanx", 4, 4, 5).with_weapons([spears.clone()]);
    let militia = with_sword(plain_unit("Militia", 4, 4, 5));

    let into_phalanx = simulate(&chargers, &phalanx, Mode::Melee);
    let into_militia = simulate(&chargers, &militia, Mode::Melee);

    // Striking first lets the phalanx remove chargers before they swing.
    assert!(into_phalanx.expected_wounds_to_b < into_militia.expected_wounds_to_b);
}

#[test]
fn test_regeneration_heals_a_third_of_wounds() {
    let axes = WeaponProfile::new("Axes", 2).unwrap();
    let attacker = plain_unit("Axemen", 3, 4, 5).with_weapons([axes]);
    let troll = UnitProfile::new("Troll", 4, 4, 6, 0, 1)
        .unwrap()
        .with_rules([rule(Regeneration::new())]);
    let ogre = UnitProfile::new("Ogre", 4, 4, 6, 0, 1).unwrap();

    let vs_troll = simulate(&attacker, &troll, Mode::Ranged);
    let vs_ogre = simulate(&attacker, &ogre, Mode::Ranged);
    assert!(close(
        vs_troll.expected_wounds_to_b,
        vs_ogre.expected_wounds_to_b * (1.0 - 2.0 / 6.0)
    ));
}

#[test]
fn test_rending_suppresses_regeneration_entirely() {
    let claws = WeaponProfile::new("Claws", 2)
        .unwrap()
        .with_rules([rule(Rending)]);
    let attacker = plain_unit("Beasts", 3, 4, 5).with_weapons([claws.clone()]);
    let troll = UnitProfile::new("Troll", 4, 2, 6, 0, 1)
        .unwrap()
        .with_rules([rule(Regeneration::new())]);
    let ogre = UnitProfile::new("Ogre", 4, 2, 6, 0, 1).unwrap();

    // With healing suppressed the regenerator takes exactly what the
    // plain target takes.
    let vs_troll = simulate(&attacker, &troll, Mode::Ranged);
    let vs_ogre = simulate(&attacker, &ogre, Mode::Ranged);
    assert!(close(
        vs_troll.expected_wounds_to_b,
        vs_ogre.expected_wounds_to_b
    ));
}

#[test]
fn test_reliable_beats_evasion() {
    // Evasion pushes quality 4 to 5; Reliable then floors it at 2.
    let needle = WeaponProfile::new("Needle", 1)
        .unwrap()
        .with_rules([rule(Reliable)]);
    let attacker = plain_unit("Sharpshooters", 4, 4, 6).with_weapons([needle]);
    let dancers = plain_unit("Dancers", 4, 7, 6).with_rules([rule(Evasion)]);

    let report = simulate(&attacker, &dancers, Mode::Ranged);
    assert!(close(report.expected_hits_to_b, 6.0 * 5.0 / 6.0));
}

#[test]
fn test_precise_improves_one_face() {
    let fine_blade = WeaponProfile::new("Fine Blade", 1)
        .unwrap()
        .with_rules([rule(Precise)]);
    let attacker = plain_unit("Duelists", 4, 4, 6).with_weapons([fine_blade]);
    let target = plain_unit("Target", 4, 7, 6);

    let report = simulate(&attacker, &target, Mode::Ranged);
    assert!(close(report.expected_hits_to_b, 6.0 * 4.0 / 6.0));
}

#[test]
fn test_overtuned_self_wounds_reach_the_attacker() {
    let volatile = WeaponProfile::new("Volatile Cannon", 6)
        .unwrap()
        .with_rules([rule(Overtuned)]);
    let attacker = plain_unit("Crew", 4, 4, 1).with_weapons([volatile]);
    let target = plain_unit("Target", 4, 4, 5);

    let report = simulate(&attacker, &target, Mode::Ranged);
    // One natural 1 expected over six dice.
    assert!(close(report.expected_wounds_to_a, 1.0));
    // Ranged defenders never strike back.
    assert!(close(report.expected_hits_to_a, 0.0));
}

#[test]
fn test_cavalry_cap_limits_base_attacks() {
    let lances = WeaponProfile::new("Lances", 2)
        .unwrap()
        .with_rules([rule(CavalryCap)]);
    let eight_riders = plain_unit("Riders", 4, 4, 8).with_weapons([lances.clone()]);
    let five_riders = plain_unit("Riders", 4, 4, 5).with_weapons([lances]);
    let target = plain_unit("Target", 4, 7, 10);

    let eight = simulate(&eight_riders, &target, Mode::Ranged);
    let five = simulate(&five_riders, &target, Mode::Ranged);
    assert!(close(eight.expected_hits_to_b, five.expected_hits_to_b));
}

#[test]
fn test_multiply_hits_doubles_expected_hits() {
    let twin = WeaponProfile::new("Twin Barrel", 1)
        .unwrap()
        .with_rules([rule(MultiplyHits(2))]);
    let single = WeaponProfile::new("Barrel", 1).unwrap();
    let gunners = plain_unit("Gunners", 4, 4, 4);
    let target = plain_unit("Target", 4, 7, 10);

    let twin_report = simulate(
        &gunners.clone().with_weapons([twin]),
        &target,
        Mode::Ranged,
    );
    let single_report = simulate(
        &gunners.with_weapons([single]),
        &target,
        Mode::Ranged,
    );
    assert!(close(
        twin_report.expected_hits_to_b,
        single_report.expected_hits_to_b * 2.0
    ));
}

#[test]
fn test_unpredictable_fighter_mixes_two_branches() {
    let blades = WeaponProfile::new("Twin Blades", 2)
        .unwrap()
        .with_rules([rule(UnpredictableFighter)]);
    let fighter = plain_unit("Fighter", 4, 4, 1).with_weapons([blades]);
    let target = plain_unit("Target", 4, 7, 1);

    let report = simulate(&fighter, &target, Mode::Ranged);
    // Half the mass rerolls at quality 3: 0.5 * 2 * 3/6 + 0.5 * 2 * 4/6.
    assert!(close(report.expected_hits_to_b, 0.5 + 2.0 / 3.0));
}

#[test]
fn test_hero_aura_lifts_the_whole_unit() {
    let bows = WeaponProfile::new("Bows", 1).unwrap().with_ranged(true);
    let captain = HeroProfile::new("Captain", 3, 4, 2, 0)
        .unwrap()
        .with_auras([rule(Precise)]);
    let with_captain = plain_unit("Archers", 4, 4, 6)
        .with_weapons([bows.clone()])
        .with_hero(captain);
    let leaderless = plain_unit("Archers", 4, 4, 6).with_weapons([bows]);
    let target = plain_unit("Target", 4, 7, 10);

    let led = simulate(&with_captain, &target, Mode::Ranged);
    let alone = simulate(&leaderless, &target, Mode::Ranged);
    assert!(close(led.expected_hits_to_b, 6.0 * 4.0 / 6.0));
    assert!(close(alone.expected_hits_to_b, 6.0 * 3.0 / 6.0));
}

#[test]
fn test_hero_fights_with_its_own_weapons() {
    let greatsword = WeaponProfile::new("Greatsword", 3).unwrap();
    let champion = HeroProfile::new("Champion", 2, 4, 2, 0)
        .unwrap()
        .with_weapons([greatsword]);
    let retinue = plain_unit("Retinue", 4, 4, 0).with_hero(champion);
    let target = plain_unit("Target", 4, 7, 5);

    let report = simulate(&retinue, &target, Mode::Ranged);
    assert!(close(report.expected_hits_to_b, 3.0 * 5.0 / 6.0));
}

#[test]
fn test_ranged_win_means_half_the_models_removed() {
    let volley_guns = WeaponProfile::new("Volley Guns", 3)
        .unwrap()
        .with_armor_penetration(4);
    let gunners = plain_unit("Gunners", 2, 4, 10).with_weapons([volley_guns]);
    let pair = plain_unit("Pair", 4, 4, 2);

    let report = simulate(&gunners, &pair, Mode::Ranged);
    // Two models: removing one is half, so any wound wins the exchange.
    let at_least_one: f64 = report
        .outcomes
        .iter()
        .filter(|(o, _)| o.wounds_to_b >= 1)
        .map(|(_, mass)| mass)
        .sum();
    assert!(close(report.win_probability_a, at_least_one));
    assert!(close(report.win_probability_b, 0.0));
    assert!(close(report.tie_probability, 0.0));
}

#[test]
fn test_fear_alone_decides_a_bloodless_melee() {
    let grim = UnitProfile::new("Grim Host", 4, 4, 1, 2, 5).unwrap();
    let meek = plain_unit("Meek", 4, 4, 5);

    let report = simulate(&grim, &meek, Mode::Melee);
    // Neither side carries a weapon; fear decides the resolution.
    assert!(close(report.expected_wounds_to_a, 0.0));
    assert!(close(report.expected_wounds_to_b, 0.0));
    assert!(close(report.win_probability_a, 1.0));
}

#[test]
fn test_shield_and_piercing_cancel() {
    let pick = WeaponProfile::new("Pick", 1)
        .unwrap()
        .with_rules([rule(Piercing(1))]);
    let plain_pick = WeaponProfile::new("Pick", 1).unwrap();
    let miners = plain_unit("Miners", 4, 4, 5);
    let shielded = plain_unit("Shieldwall", 4, 4, 5).with_rules([rule(Shield)]);
    let bare = plain_unit("Levies", 4, 4, 5);

    let pierced_shield = simulate(
        &miners.clone().with_weapons([pick]),
        &shielded,
        Mode::Ranged,
    );
    let plain_bare = simulate(&miners.with_weapons([plain_pick]), &bare, Mode::Ranged);
    assert!(close(
        pierced_shield.expected_wounds_to_b,
        plain_bare.expected_wounds_to_b
    ));
}

#[test]
fn test_combined_unit_doubles_output() {
    let swords = WeaponProfile::new("Swords", 1).unwrap();
    let single = plain_unit("Company", 4, 4, 5).with_weapons([swords.clone()]);
    let doubled = plain_unit("Company", 4, 4, 5)
        .with_weapons([swords])
        .combined()
        .unwrap();
    let target = plain_unit("Target", 4, 7, 20);

    let single_report = simulate(&single, &target, Mode::Ranged);
    let double_report = simulate(&doubled, &target, Mode::Ranged);
    assert!(close(
        double_report.expected_hits_to_b,
        single_report.expected_hits_to_b * 2.0
    ));
}

#[test]
fn test_identical_inputs_give_identical_reports() {
    let claws = WeaponProfile::new("Claws", 2)
        .unwrap()
        .with_rules([rule(Rending), rule(Furious)]);
    let beasts = UnitProfile::new("Beasts", 3, 5, 2, 1, 6)
        .unwrap()
        .with_weapons([claws]);
    let wall = {
        let spears = WeaponProfile::new("Spears", 1)
            .unwrap()
            .with_rules([rule(Counter)]);
        UnitProfile::new("Wall", 4, 3, 1, 0, 10)
            .unwrap()
            .with_weapons([spears])
            .with_rules([rule(Shield), rule(Regeneration::lesser())])
    };

    let first = simulate(&beasts, &wall, Mode::Melee);
    let second = simulate(&beasts, &wall, Mode::Melee);
    assert_eq!(first, second);
}

#[test]
fn test_report_round_trips_through_json() {
    let a = with_sword(plain_unit("A", 4, 4, 5));
    let b = with_sword(plain_unit("B", 4, 4, 5));
    let report = simulate(&a, &b, Mode::Melee);

    let json = serde_json::to_string(&report).unwrap();
    let restored: wardice::BattleReport = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.outcomes.len(), report.outcomes.len());
    assert!(close(restored.win_probability_a, report.win_probability_a));
    assert!(close(restored.expected_wounds_to_b, report.expected_wounds_to_b));
    assert!(close(restored.outcomes.total_mass(), 1.0));
}

#[test]
fn test_melee_wipe_probability_matches_capacity() {
    let hammers = WeaponProfile::new("Hammers", 2).unwrap();
    let brutes = plain_unit("Brutes", 2, 4, 6).with_weapons([hammers]);
    let pair = UnitProfile::new("Pair", 4, 7, 1, 0, 2).unwrap();

    let report = simulate(&brutes, &pair, Mode::Melee);
    let wiped: f64 = report
        .outcomes
        .iter()
        .filter(|(o, _)| o.wounds_to_b >= pair.total_wound_capacity())
        .map(|(_, mass)| mass)
        .sum();
    assert!(close(report.wipe_probability_b, wiped));
    assert!(report.wipe_probability_b > 0.5);
}
