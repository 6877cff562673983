//! Port and seed parsing for the simulator command line.

use telemdash_sim::{parse_port, parse_seed, DEFAULT_PORT};

fn argv(list: &[&str]) -> Vec<String> {
    std::iter::once("telemdash_sim")
        .chain(list.iter().copied())
        .map(String::from)
        .collect()
}

#[test]
fn port_long_short_and_assign() {
    assert_eq!(parse_port(argv(&["--port", "9001"]), DEFAULT_PORT), 9001);
    assert_eq!(parse_port(argv(&["-p", "9002"]), DEFAULT_PORT), 9002);
    assert_eq!(parse_port(argv(&["--port=9003"]), DEFAULT_PORT), 9003);
    assert_eq!(parse_port(argv(&[]), DEFAULT_PORT), 8001);
    assert_eq!(parse_port(argv(&["--port", "nope"]), DEFAULT_PORT), 8001);
}

#[test]
fn seed_forms() {
    assert_eq!(parse_seed(argv(&["--seed", "42"])), Some(42));
    assert_eq!(parse_seed(argv(&["-p", "1", "--seed=7"])), Some(7));
    assert_eq!(parse_seed(argv(&["--seed"])), None);
}
