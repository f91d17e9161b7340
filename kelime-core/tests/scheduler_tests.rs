use chrono::{Duration, TimeZone, Utc};
use kelime_core::{
    apply_review, compute_next_state, compute_next_state_for_rating, CardState, CoreError,
    Difficulty, Quality, VocabularyCard, EF_DEFAULT, EF_MIN, MAX_INTERVAL_DAYS,
};

fn q(rating: u8) -> Quality {
    Quality::new(rating).unwrap()
}

fn fresh() -> CardState {
    CardState::new(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
}

#[test]
fn easy_from_new() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
    let next = compute_next_state(&fresh(), q(5), now);

    assert_eq!(next.repetition_level, 1);
    assert_eq!(next.interval_days, 1);
    assert!((next.ease_factor - 2.6).abs() < 1e-9);
    assert_eq!(next.next_review, now + Duration::days(1));
}

#[test]
fn success_streak_grows_interval() {
    let now = Utc::now();
    let s1 = compute_next_state(&fresh(), q(5), now);
    let s2 = compute_next_state(&s1, q(5), now);
    let s3 = compute_next_state(&s2, q(5), now);

    assert_eq!(
        [s1.interval_days, s2.interval_days, s3.interval_days],
        [1, 6, 16]
    );
    assert_eq!(
        [s1.repetition_level, s2.repetition_level, s3.repetition_level],
        [1, 2, 3]
    );
    // third interval uses the ease the card had going in (2.7), not the updated 2.8
    assert_eq!(s3.interval_days, (6.0 * s2.ease_factor).round() as u32);
    assert!((s3.ease_factor - 2.8).abs() < 1e-9);
}

#[test]
fn medium_keeps_streak_but_lowers_ease() {
    let next = compute_next_state(&fresh(), Difficulty::Medium.quality(), Utc::now());
    assert_eq!(next.repetition_level, 1);
    assert_eq!(next.interval_days, 1);
    assert!((next.ease_factor - (EF_DEFAULT - 0.14)).abs() < 1e-9);
}

#[test]
fn hard_resets_streak() {
    let mut state = fresh();
    state.repetition_level = 4;
    state.interval_days = 37;
    state.ease_factor = 2.4;

    let next = compute_next_state(&state, Difficulty::Hard.quality(), Utc::now());
    assert_eq!(next.repetition_level, 0);
    assert_eq!(next.interval_days, 1);
    assert!((next.ease_factor - 1.86).abs() < 1e-9);
}

#[test]
fn ease_never_drops_below_floor() {
    let now = Utc::now();
    for rating in 0..=5 {
        let mut state = fresh();
        for _ in 0..20 {
            state = compute_next_state(&state, q(rating), now);
            assert!(state.ease_factor >= EF_MIN, "rating {rating}: {}", state.ease_factor);
            assert!(state.interval_days >= 1);
        }
    }

    let mut low = fresh();
    low.ease_factor = EF_MIN;
    let next = compute_next_state(&low, q(0), now);
    assert_eq!(next.ease_factor, EF_MIN);
}

#[test]
fn same_input_same_output() {
    let now = Utc.with_ymd_and_hms(2026, 5, 5, 5, 5, 5).unwrap();
    let mut state = fresh();
    state.repetition_level = 3;
    state.interval_days = 15;
    state.ease_factor = 2.36;

    let a = compute_next_state(&state, q(4), now);
    let b = compute_next_state(&state, q(4), now);
    assert_eq!(a, b);
    assert_eq!(a.interval_days, 35);
}

#[test]
fn out_of_range_rating_is_rejected() {
    let err = compute_next_state_for_rating(&fresh(), 6, Utc::now()).unwrap_err();
    assert!(matches!(err, CoreError::InvalidInput(_)));
    assert!(Quality::new(255).is_err());
    assert!(compute_next_state_for_rating(&fresh(), 0, Utc::now()).is_ok());
}

#[test]
fn apply_review_tracks_counts() {
    let now = Utc::now();
    let card = VocabularyCard::new("merhaba", "hello");

    let out = apply_review(card, q(5), now);
    let card = out.updated_card;
    assert_eq!(out.previous.repetition_level, 0);
    assert_eq!(card.correct_count, 1);
    assert_eq!(card.incorrect_count, 0);
    assert_eq!(card.last_reviewed_at, Some(now));

    let card = apply_review(card, q(1), now).updated_card;
    assert_eq!(card.correct_count, 1);
    assert_eq!(card.incorrect_count, 1);
    assert_eq!(card.schedule.repetition_level, 0);
}

#[test]
fn ratings_are_validated_when_deserialized() {
    let q: Quality = serde_json::from_str("4").unwrap();
    assert_eq!(q.value(), 4);
    assert!(serde_json::from_str::<Quality>("9").is_err());

    let d: Difficulty = serde_json::from_str("\"medium\"").unwrap();
    assert_eq!(d.quality().value(), 3);
    assert!("so-so".parse::<Difficulty>().is_err());
}

#[test]
fn long_easy_streak_stays_in_range() {
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
    let mut state = fresh();
    for n in 0..40 {
        state = compute_next_state(&state, q(5), now);
        assert!(state.interval_days >= 1, "step {n}");
        assert!(state.interval_days <= MAX_INTERVAL_DAYS, "step {n}: {}", state.interval_days);
        assert!(state.next_review >= now, "step {n}");
    }
    assert_eq!(state.interval_days, MAX_INTERVAL_DAYS);
    assert_eq!(state.next_review, now + Duration::days(MAX_INTERVAL_DAYS as i64));
}

#[test]
fn review_near_the_end_of_time_saturates() {
    let mut state = fresh();
    state.repetition_level = 5;
    state.interval_days = MAX_INTERVAL_DAYS;
    state.ease_factor = 3.0;

    let late = chrono::DateTime::<Utc>::MAX_UTC - Duration::days(10);
    let next = compute_next_state(&state, q(5), late);
    assert_eq!(next.interval_days, MAX_INTERVAL_DAYS);
    assert_eq!(next.next_review, chrono::DateTime::<Utc>::MAX_UTC);
}

#[test]
fn out_of_range_schedule_is_rejected_on_load() {
    let good = VocabularyCard::with_id("c1", "ev", "house", Utc::now());
    let mut value = serde_json::to_value(&good).unwrap();
    let back: VocabularyCard = serde_json::from_value(value.clone()).unwrap();
    assert_eq!(back, good);

    value["schedule"]["ease_factor"] = serde_json::json!(0.2);
    value["schedule"]["interval_days"] = serde_json::json!(0);
    assert!(serde_json::from_value::<VocabularyCard>(value.clone()).is_err());

    value["schedule"]["ease_factor"] = serde_json::json!(EF_DEFAULT);
    assert!(serde_json::from_value::<VocabularyCard>(value.clone()).is_err());

    value["schedule"]["interval_days"] = serde_json::json!(MAX_INTERVAL_DAYS + 1);
    assert!(serde_json::from_value::<VocabularyCard>(value.clone()).is_err());

    value["schedule"]["interval_days"] = serde_json::json!(1);
    value["schedule"]["ease_factor"] = serde_json::json!(1.0);
    assert!(serde_json::from_value::<VocabularyCard>(value).is_err());

    let mut bad = fresh();
    bad.ease_factor = f64::NAN;
    assert!(matches!(bad.validate(), Err(CoreError::InvalidInput(_))));
    assert!(fresh().validate().is_ok());
}
