use approx::assert_relative_eq;
use displayctl_state::DisplayState;
use proptest::prelude::*;

use super::fixture::{spec, three_monitors};
use super::*;
use crate::cli::SetArgs;
use crate::client::{build_config, SetOptions};

fn linkage(state: &DisplayState) -> Vec<Vec<String>> {
    state
        .logical_monitors()
        .iter()
        .map(|lm| {
            state
                .monitors_of(lm)
                .map(|m| m.connector().to_owned())
                .collect()
        })
        .collect()
}

proptest! {
    #[test]
    fn linkage_does_not_depend_on_monitor_order(
        order in Just(vec![0usize, 1, 2]).prop_shuffle()
    ) {
        let mut wire = three_monitors();
        let monitors = wire.monitors.clone();
        wire.monitors = order.iter().map(|&idx| monitors[idx].clone()).collect();

        let state = wire.decode().unwrap();
        prop_assert_eq!(
            linkage(&state),
            vec![vec![String::from("eDP-1")], vec![String::from("DP-1")]]
        );
    }

    #[test]
    fn mirrored_linkage_keeps_all_monitors(
        order in Just(vec![0usize, 1, 2]).prop_shuffle()
    ) {
        let mut wire = three_monitors();
        let monitors = wire.monitors.clone();
        wire.monitors = order.iter().map(|&idx| monitors[idx].clone()).collect();
        wire.logical_monitors.truncate(1);
        wire.logical_monitors[0].monitors = vec![
            spec("eDP-1", "BOE", "0x0bca", "0x00000000"),
            spec("HDMI-1", "SAM", "SAMSUNG", "0x01000e00"),
        ];

        let state = wire.decode().unwrap();
        let mut linked = linkage(&state).remove(0);
        linked.sort();
        prop_assert_eq!(linked, vec![String::from("HDMI-1"), String::from("eDP-1")]);
    }

    #[test]
    fn scale_survives_apply(scale in 1u32..=12) {
        // Quarter steps from 0.25 to 3.
        let scale = f64::from(scale) / 4.;

        let f = Fixture::new(three_monitors());
        let state = f.fetch();
        let args = SetArgs {
            args: vec![
                String::from("-L"),
                String::from("-s"),
                scale.to_string(),
                String::from("-M"),
                String::from("DP-1"),
            ],
        };
        let options = SetOptions::parse(&args).unwrap();
        let config = build_config(&state, &options).unwrap();
        f.manager.apply(&state, &config, options.method).unwrap();

        let new_state = f.fetch();
        let logical_monitor = &new_state.logical_monitors()[0];
        assert_relative_eq!(logical_monitor.scale(), scale);
        prop_assert_eq!(
            logical_monitor.layout().width,
            (3840. / scale).round() as i32
        );
    }
}
