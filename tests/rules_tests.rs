use npcgen::data::level_data::{LevelEntry, LevelTable};
use npcgen::dice::{DiceError, Die, DieFace};
use npcgen::rules::challenge::calculate;
use npcgen::rules::{
    compute, Challenge, ChallengeModifier, ChallengeRange, ChallengeRules, FormulaContext,
    FormulaError, ModifierStack, OffensiveMedian, Operation, StatTarget,
};

fn titled(title: &str) -> LevelEntry {
    LevelEntry {
        title: Some(title.to_string()),
        ..LevelEntry::default()
    }
}

fn modifier(target: StatTarget, operation: Operation, value: i32) -> ChallengeModifier {
    ChallengeModifier::new(target, operation, value)
}

#[test]
fn level_lookup_falls_back_to_nearest_lower_entry() {
    let table: LevelTable = [(1, titled("Novice")), (5, titled("Adept")), (11, titled("Master"))]
        .into_iter()
        .collect();

    let title = |level: i32| table.get(level).and_then(|entry| entry.title.clone());
    assert_eq!(title(1).as_deref(), Some("Novice"));
    assert_eq!(title(4).as_deref(), Some("Novice"));
    assert_eq!(title(5).as_deref(), Some("Adept"));
    assert_eq!(title(10).as_deref(), Some("Adept"));
    assert_eq!(title(20).as_deref(), Some("Master"));
    assert_eq!(title(0), None);
    assert_eq!(title(-3), None);
}

#[test]
fn level_lookup_without_low_entries_is_empty() {
    let table: LevelTable = [(6, titled("Captain"))].into_iter().collect();
    assert!(table.get(5).is_none());
    assert!(table.get(6).is_some());
}

#[test]
fn populated_levels_are_never_replaced() {
    let mut table = LevelTable::new();
    assert!(table.insert(3, titled("first")));
    assert!(!table.insert(3, titled("second")));
    assert_eq!(table.get(3).and_then(|e| e.title.as_deref()), Some("first"));
}

#[test]
fn ranks_are_strictly_ordered_by_experience() {
    let ranks: Vec<Challenge> = Challenge::all().collect();
    assert_eq!(ranks.len(), 34);
    assert!(ranks.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(ranks
        .windows(2)
        .all(|pair| pair[0].xp_value() < pair[1].xp_value()));
    assert_eq!(ranks.first(), Some(&Challenge::lowest()));
    assert_eq!(ranks.last(), Some(&Challenge::highest()));
}

#[test]
fn stepping_clamps_at_both_ends() {
    assert_eq!(Challenge::Zero.previous(), Challenge::Zero);
    assert_eq!(Challenge::Thirty.next(), Challenge::Thirty);
    assert_eq!(Challenge::OneHalf.next(), Challenge::One);
    assert_eq!(Challenge::One.previous(), Challenge::OneHalf);
    assert_eq!(Challenge::Two.step(-10), Challenge::Zero);
    assert_eq!(Challenge::TwentyNine.step(4), Challenge::Thirty);
    for rank in Challenge::all().skip(1) {
        assert_eq!(rank.previous().next(), rank);
    }
}

#[test]
fn proficiency_grows_with_rank() {
    assert_eq!(Challenge::Zero.proficiency(), 2);
    assert_eq!(Challenge::Four.proficiency(), 2);
    assert_eq!(Challenge::Five.proficiency(), 3);
    assert_eq!(Challenge::Thirty.proficiency(), 9);
}

#[test]
fn unremarkable_numbers_classify_at_the_bottom() {
    assert_eq!(calculate(4, 10, 2, 0), Challenge::Zero);
    assert_eq!(calculate(0, 10, 2, 0), Challenge::Zero);
    assert_eq!(calculate(4, 10, 2, 10_000), Challenge::Zero);
}

#[test]
fn numbers_inside_every_band_keep_the_rank() {
    let rules = ChallengeRules::default();
    assert_eq!(rules.defensive(80, 13), Some(Challenge::One));
    assert_eq!(rules.offensive(3, 10), Some(Challenge::One));
    assert_eq!(rules.calculate(80, 13, 3, 10), Challenge::One);
}

#[test]
fn armor_class_outside_band_moves_rank_by_half_the_gap() {
    let rules = ChallengeRules::default();
    // Hit points 80 sit at rank 1, whose armor class median is 13.
    assert_eq!(rules.defensive(80, 20), Some(Challenge::OneEighth));
    assert_eq!(rules.defensive(80, 8), Some(Challenge::Three));
    assert_eq!(rules.defensive(80, 15), Some(Challenge::OneHalf));
    assert_eq!(rules.defensive(80, 10), Some(Challenge::Two));
    assert_eq!(rules.defensive(3, 30), Some(Challenge::Zero));
    assert_eq!(rules.defensive(830, 0), Some(Challenge::Thirty));
}

#[test]
fn attack_bonus_outside_band_moves_rank_by_half_the_gap() {
    let rules = ChallengeRules::new(OffensiveMedian::AttackBonus);
    // Damage 10 sits at rank 1, whose attack bonus median is 3.
    assert_eq!(rules.offensive(0, 10), Some(Challenge::Two));
    assert_eq!(rules.offensive(9, 10), Some(Challenge::OneEighth));
    assert_eq!(rules.offensive(40, 0), Some(Challenge::Zero));
}

#[test]
fn averaging_snaps_down_to_a_listed_rating() {
    assert_eq!(Challenge::average(Challenge::One, Challenge::Four), Challenge::Two);
    assert_eq!(Challenge::average(Challenge::Four, Challenge::One), Challenge::Two);
    assert_eq!(Challenge::average(Challenge::OneHalf, Challenge::One), Challenge::OneHalf);
    assert_eq!(Challenge::average(Challenge::Zero, Challenge::OneFourth), Challenge::OneEighth);
    assert_eq!(Challenge::average(Challenge::OneEighth, Challenge::OneHalf), Challenge::OneFourth);
    assert_eq!(Challenge::average(Challenge::Zero, Challenge::Thirty), Challenge::Fifteen);
    assert_eq!(Challenge::average(Challenge::TwentyNine, Challenge::Thirty), Challenge::TwentyNine);
    assert_eq!(Challenge::average(Challenge::Thirty, Challenge::Thirty), Challenge::Thirty);
}

#[test]
fn offensive_median_choice_changes_attack_adjustment() {
    let by_armor_class = ChallengeRules::new(OffensiveMedian::ArmorClass);
    let by_attack_bonus = ChallengeRules::new(OffensiveMedian::AttackBonus);
    // Attack bonus 9 is outside the 1/2 band (2..=4).
    assert_eq!(by_attack_bonus.offensive(9, 7), Some(Challenge::OneHalf.step(-3)));
    assert_eq!(by_armor_class.offensive(9, 7), Some(Challenge::OneHalf.step(2)));
    assert_eq!("attack-bonus".parse::<OffensiveMedian>(), Ok(OffensiveMedian::AttackBonus));
    assert!("median".parse::<OffensiveMedian>().is_err());
}

#[test]
fn ranges_union_and_intersect() {
    let low = ChallengeRange::new(Challenge::Zero, Challenge::Two);
    let high = ChallengeRange::new(Challenge::One, Challenge::Five);
    let apart = ChallengeRange::new(Challenge::Ten, Challenge::Twelve);

    assert_eq!(low.union(&high), ChallengeRange::new(Challenge::Zero, Challenge::Five));
    assert_eq!(
        low.intersect(&high),
        Some(ChallengeRange::new(Challenge::One, Challenge::Two))
    );
    assert_eq!(low.intersect(&apart), None);
    assert_eq!(
        ChallengeRange::new(Challenge::Five, Challenge::One),
        ChallengeRange::new(Challenge::One, Challenge::Five)
    );
    assert_eq!(ChallengeRange::full().count(), 34);
}

#[test]
fn override_wins_and_smallest_override_is_taken() {
    let modifiers = vec![
        modifier(StatTarget::HitPoints, Operation::Add, 50),
        modifier(StatTarget::HitPoints, Operation::Override, 30),
        modifier(StatTarget::HitPoints, Operation::Multiply, 4),
        modifier(StatTarget::HitPoints, Operation::Override, 12),
    ];
    assert_eq!(compute(&modifiers, 7), 12);
}

#[test]
fn modifiers_without_override_fold_in_list_order() {
    let add_then_multiply = vec![
        modifier(StatTarget::ArmorClass, Operation::Add, 2),
        modifier(StatTarget::ArmorClass, Operation::Multiply, 3),
    ];
    let multiply_then_add = vec![
        modifier(StatTarget::ArmorClass, Operation::Multiply, 3),
        modifier(StatTarget::ArmorClass, Operation::Add, 2),
    ];
    assert_eq!(compute(&add_then_multiply, 10), 36);
    assert_eq!(compute(&multiply_then_add, 10), 32);
    assert_eq!(compute(&[], 10), 10);
}

#[test]
fn division_truncates_toward_zero() {
    let halve = vec![modifier(StatTarget::DamagePerRound, Operation::Divide, 2)];
    assert_eq!(compute(&halve, 7), 3);
    assert_eq!(compute(&halve, -7), -3);
}

#[test]
fn stack_applies_only_matching_target() {
    let stack: ModifierStack = vec![
        modifier(StatTarget::HitPoints, Operation::Add, 5),
        modifier(StatTarget::ArmorClass, Operation::Override, 18),
    ]
    .into_iter()
    .collect();
    assert_eq!(stack.apply(StatTarget::HitPoints, 10), 15);
    assert_eq!(stack.apply(StatTarget::ArmorClass, 12), 18);
    assert_eq!(stack.apply(StatTarget::AttackBonus, 4), 4);
}

#[test]
fn formulas_see_level_and_wisdom() {
    let ctx = FormulaContext { level: 8, wis: 3 };
    let parsed = ChallengeModifier::parse("attackBonus =wis+level/4", &ctx).unwrap();
    assert_eq!(parsed, modifier(StatTarget::AttackBonus, Operation::Override, 5));

    let parsed = ChallengeModifier::parse("hitPoints +level*2", &ctx).unwrap();
    assert_eq!(parsed.value, 16);

    assert!(matches!(
        ChallengeModifier::parse("speed +2", &ctx),
        Err(FormulaError::UnknownTarget(_))
    ));
    assert!(matches!(
        ChallengeModifier::parse("hitPoints +charm", &ctx),
        Err(FormulaError::UnknownVariable(_))
    ));
}

#[test]
fn dice_parse_display_and_grow() {
    let die: Die = "2d6".parse().unwrap();
    assert_eq!(die, Die::new(DieFace::D6, 2));
    assert_eq!(die.to_string(), "2d6");
    assert_eq!(die.average(), 7.0);

    assert_eq!(Die::new(DieFace::D4, 1).next(), Die::new(DieFace::D6, 1));
    assert_eq!(Die::new(DieFace::D12, 1).next(), Die::new(DieFace::D6, 2));

    let mut d4 = Die::new(DieFace::D4, 1);
    d4.increase();
    assert_eq!(d4, Die::new(DieFace::D4, 2));

    assert_eq!(die.progressive(5), die);
    assert_eq!(die.progressive(10), Die::new(DieFace::D6, 4));
    assert_eq!(die.progressive(20), Die::new(DieFace::D6, 6));

    assert!(matches!("d6".parse::<Die>(), Err(DiceError::Malformed(_))));
    assert!(matches!("1d7".parse::<Die>(), Err(DiceError::UnsupportedFace(7))));
}
