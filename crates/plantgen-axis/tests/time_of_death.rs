use plantgen_axis::death::decide_time_of_death;
use proptest::prelude::*;

#[test]
fn ten_axes_decline_to_four() {
    let emergence: Vec<f64> = (0..10).map(|i| f64::from(i) * 5.0).collect();
    let death = decide_time_of_death(10, 4, &emergence, 100.0, 200.0).unwrap();
    let killed: Vec<f64> = death.iter().flatten().copied().collect();
    assert_eq!(killed.len(), 6);
    assert!(killed.iter().all(|t| (100.0..=200.0).contains(t)));
    // the four oldest axes survive
    assert!(death[..4].iter().all(Option::is_none));
    // younger axes die no later than older ones
    for pair in death[4..].windows(2) {
        assert!(pair[1].unwrap() <= pair[0].unwrap());
    }
}

#[test]
fn preconditions_are_enforced() {
    let emergence = [0.0, 1.0, 2.0];
    let cases = [
        decide_time_of_death(3, 3, &emergence, 100.0, 200.0),
        decide_time_of_death(3, 1, &emergence, 200.0, 200.0),
        decide_time_of_death(3, 1, &emergence, 300.0, 200.0),
        decide_time_of_death(3, 1, &emergence, -1.0, 200.0),
        decide_time_of_death(3, 1, &emergence, 100.0, f64::INFINITY),
        decide_time_of_death(4, 1, &emergence, 100.0, 200.0),
    ];
    for case in cases {
        let err = case.unwrap_err();
        assert_eq!(err.info().code, "invalid-schedule");
    }
}

proptest! {
    #[test]
    fn exactly_the_surplus_dies_within_the_window(
        emergence in prop::collection::vec(-20.0f64..20.0, 2..60),
        final_ratio in 0.0f64..1.0,
        bolting in 0.0f64..800.0,
        window in 0.5f64..400.0,
    ) {
        let max_count = emergence.len();
        let final_count = ((max_count - 1) as f64 * final_ratio).floor() as usize;
        let flowering = bolting + window;
        let death = decide_time_of_death(max_count, final_count, &emergence, bolting, flowering).unwrap();
        let killed: Vec<f64> = death.iter().flatten().copied().collect();
        prop_assert_eq!(killed.len(), max_count - final_count);
        prop_assert!(killed.iter().all(|t| *t >= bolting && *t <= flowering));
        let youngest_survivor = death
            .iter()
            .zip(&emergence)
            .filter(|(d, _)| d.is_none())
            .map(|(_, e)| *e)
            .fold(f64::NEG_INFINITY, f64::max);
        for (d, e) in death.iter().zip(&emergence) {
            if d.is_some() {
                prop_assert!(*e >= youngest_survivor);
            }
        }
    }
}
