//! Behavioural tests for host bootstrap.

use std::cell::RefCell;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use foreign_config::UnsupportedPolicy;

use super::support::{BootstrapWorld, HealthEvent, test_config};

#[fixture]
fn world() -> RefCell<BootstrapWorld> {
    RefCell::new(BootstrapWorld::new())
}

#[given("a failing configuration loader")]
fn given_failing_loader(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().use_failing_loader();
}

#[given("a configuration that answers unsupported kinds")]
fn given_reply_policy(world: &RefCell<BootstrapWorld>) {
    let config = foreign_config::Config {
        unsupported_kinds: UnsupportedPolicy::Reply,
        ..test_config()
    };
    world.borrow_mut().use_config(config);
}

#[when("the host bootstraps")]
fn when_host_bootstraps(world: &RefCell<BootstrapWorld>) {
    world.borrow_mut().bootstrap();
}

#[then("bootstrap succeeds")]
fn then_bootstrap_succeeds(world: &RefCell<BootstrapWorld>) {
    let state = world.borrow();
    assert!(state.error().is_none(), "bootstrap error: {:?}", state.error());
    assert!(state.host().is_some(), "host should have been built");
}

#[then("bootstrap fails mentioning \"{fragment}\"")]
fn then_bootstrap_fails(world: &RefCell<BootstrapWorld>, fragment: String) {
    let state = world.borrow();
    let error = state.error().expect("bootstrap succeeded unexpectedly");
    let message = error.to_string();
    assert!(
        message.contains(strip_quotes(&fragment)),
        "'{message}' does not mention '{fragment}'"
    );
}

#[then("the reporter recorded bootstrap start")]
fn then_reporter_start(world: &RefCell<BootstrapWorld>) {
    let events = world.borrow().reporter.events();
    assert_eq!(events.first(), Some(&HealthEvent::BootstrapStarting));
}

#[then("the reporter recorded bootstrap success")]
fn then_reporter_success(world: &RefCell<BootstrapWorld>) {
    let events = world.borrow().reporter.events();
    assert!(
        events.contains(&HealthEvent::BootstrapSucceeded),
        "bootstrap success event missing: {events:?}"
    );
}

#[then("the reporter recorded bootstrap failure")]
fn then_reporter_failure(world: &RefCell<BootstrapWorld>) {
    let events = world.borrow().reporter.events();
    let failed = events.iter().any(|event| {
        matches!(event, HealthEvent::BootstrapFailed(message) if message.contains("configuration"))
    });
    assert!(failed, "bootstrap failure event missing: {events:?}");
    assert!(!events.contains(&HealthEvent::BootstrapSucceeded));
}

#[then("the bridge answers unsupported kinds")]
fn then_bridge_replies(world: &RefCell<BootstrapWorld>) {
    let state = world.borrow();
    let host = state.host().expect("host missing");
    assert!(host.bridge_options().reply_unsupported);
}

fn strip_quotes(text: &str) -> &str {
    text.trim_matches('"')
}

#[scenario(path = "tests/features/host_bootstrap.feature")]
fn host_bootstrap(world: RefCell<BootstrapWorld>) {
    drop(world);
}
