//! End-to-end guard scenarios over the in-memory history and router.

mod common;

use common::*;
use navigation_guard::*;
use std::cell::RefCell;
use std::rc::Rc;

// ============================================================================
// Programmatic navigation
// ============================================================================

#[test]
fn test_refusing_guard_keeps_location() {
    let app = TestApp::new(&["/"]);
    let (options, calls) = counting(false);
    let _guard = app.scope().use_navigation_guard(options).unwrap();

    app.push("/x");
    assert_eq!(app.url(), "/");
    assert_eq!(app.router.rendered(), "/");
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_disabled_guard_is_never_asked() {
    let app = TestApp::new(&["/"]);
    let (options, calls) = counting(false);
    let _guard = app
        .scope()
        .use_navigation_guard(options.enabled_when(|_| false))
        .unwrap();

    app.push("/x");
    assert_eq!(app.url(), "/x");
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_ui_confirmation_holds_navigation_until_accepted() {
    let mut app = TestApp::new(&["/"]);
    let guard = app.scope().use_navigation_guard(GuardOptions::new()).unwrap();

    app.push("/x");
    app.settle();
    assert!(guard.active());
    assert_eq!(app.url(), "/");

    guard.accept();
    app.settle();
    assert!(!guard.active());
    assert_eq!(app.url(), "/x");
}

#[test]
fn test_first_refusal_stops_evaluation() {
    let app = TestApp::new(&["/"]);
    let (first, first_calls) = counting(false);
    let (second, second_calls) = counting(true);
    let _first = app.scope().use_navigation_guard(first).unwrap();
    let _second = app.scope().use_navigation_guard(second).unwrap();

    app.push("/x");
    assert_eq!(app.url(), "/");
    assert_eq!(first_calls.get(), 1);
    assert_eq!(second_calls.get(), 0);
}

#[test]
fn test_no_guard_means_no_prompt() {
    let app = TestApp::new(&["/"]);
    app.push("/a");
    app.provider
        .router()
        .unwrap()
        .replace("/b", NavigateOptions::default());

    assert_eq!(app.url(), "/b");
    assert_eq!(app.history.len(), 2);
}

#[test]
fn test_reject_twice_is_idempotent() {
    let mut app = TestApp::new(&["/"]);
    let guard = app.scope().use_navigation_guard(GuardOptions::new()).unwrap();
    let transitions = Rc::new(RefCell::new(Vec::new()));
    let seen = transitions.clone();
    guard.subscribe(move |active| seen.borrow_mut().push(active));

    app.push("/x");
    app.settle();
    guard.reject();
    guard.reject();
    app.settle();

    assert_eq!(app.url(), "/");
    assert_eq!(*transitions.borrow(), vec![true, false]);
}

#[test]
fn test_failing_guard_denies() {
    let app = TestApp::new(&["/"]);
    let _guard = app
        .scope()
        .use_navigation_guard(
            GuardOptions::new()
                .confirm(|_| Confirmation::Failed(GuardError::callback("form unreadable"))),
        )
        .unwrap();

    let verdict = pollster::block_on(
        app.provider
            .router()
            .unwrap()
            .navigate(RouterCall::Push("/x".into(), NavigateOptions::default())),
    );
    assert!(matches!(
        verdict.deny_reason(),
        Some(DenyReason::Failed { .. })
    ));
    assert_eq!(app.url(), "/");
}

#[test]
fn test_unmounted_guard_no_longer_blocks() {
    let app = TestApp::new(&["/"]);
    let (options, _calls) = counting(false);
    let guard = app.scope().use_navigation_guard(options).unwrap();

    app.push("/blocked");
    drop(guard);
    app.push("/free");
    assert_eq!(app.url(), "/free");
}

// ============================================================================
// History traversal
// ============================================================================

#[test]
fn test_denied_back_leaves_location_identical() {
    let mut app = TestApp::new(&["/a", "/b"]);
    let (options, seen) = recording(false);
    let _guard = app.scope().use_navigation_guard(options).unwrap();

    app.history.back();
    app.settle();

    assert_eq!(app.url(), "/b");
    assert_eq!(app.router.rendered(), "/b");
    assert_eq!(
        *seen.borrow(),
        vec![NavigationAttempt::new("/a", NavigationType::TraverseBack)]
    );
}

#[test]
fn test_accepted_back_renders_destination() {
    let mut app = TestApp::new(&["/a", "/b"]);
    let guard = app.scope().use_navigation_guard(GuardOptions::new()).unwrap();

    app.history.back();
    app.settle();
    assert!(guard.active());
    assert_eq!(app.url(), "/b");

    guard.accept();
    app.settle();
    assert_eq!(app.url(), "/a");
    assert_eq!(app.router.rendered(), "/a");
}

#[test]
fn test_denied_double_back_leaves_location_identical() {
    let mut app = TestApp::new(&["/a", "/b", "/c"]);
    let (options, seen) = recording(false);
    let _guard = app.scope().use_navigation_guard(options).unwrap();

    app.history.back();
    app.history.back();
    app.settle();

    assert_eq!(app.url(), "/c");
    assert_eq!(app.router.rendered(), "/c");
    assert!(!seen.borrow().is_empty());
    assert!(seen
        .borrow()
        .iter()
        .all(|attempt| attempt.kind == NavigationType::TraverseBack));
}

#[test]
fn test_accepted_double_back_lands_on_first_destination() {
    let mut app = TestApp::new(&["/a", "/b", "/c"]);
    let guard = app.scope().use_navigation_guard(GuardOptions::new()).unwrap();

    app.history.back();
    app.history.back();
    app.settle();
    assert!(guard.active());
    assert_eq!(app.url(), "/c");
    assert_eq!(app.router.rendered(), "/c");

    guard.accept();
    app.settle();
    assert_eq!(app.url(), "/b");
    assert_eq!(app.router.rendered(), "/b");
}

#[test]
fn test_traversal_after_guarded_push() {
    let mut app = TestApp::new(&["/"]);
    app.push("/list");
    app.push("/detail");

    let (options, _seen) = recording(false);
    let _guard = app.scope().use_navigation_guard(options).unwrap();
    app.history.back();
    app.settle();
    assert_eq!(app.url(), "/detail");
}

#[test]
fn test_history_interception_can_be_switched_off() {
    let mut app = TestApp::with_config(&["/a", "/b"], InterceptConfig::new().intercept_history(false));
    let (options, calls) = counting(false);
    let _guard = app.scope().use_navigation_guard(options).unwrap();

    app.history.back();
    app.settle();
    assert_eq!(app.url(), "/a");
    assert_eq!(calls.get(), 0);
}

// ============================================================================
// Links and unload
// ============================================================================

#[test]
fn test_external_link_never_consults_a_guard() {
    let app = TestApp::new(&["/"]);
    let (options, calls) = counting(false);
    let _guard = app.scope().use_navigation_guard(options).unwrap();

    let click = FakeClick::on(&FakeAnchor::link("https://other.example"));
    let outcome = app.provider.link_adapter().unwrap().handle_click(&click);

    assert_eq!(outcome, ClickOutcome::Skipped(SkipReason::External));
    assert!(!click.suppressed.get());
    assert_eq!(calls.get(), 0);
}

#[test]
fn test_guarded_link_follows_after_accept() {
    let mut app = TestApp::new(&["/"]);
    let guard = app.scope().use_navigation_guard(GuardOptions::new()).unwrap();
    let anchor = FakeAnchor::link("/profile");
    let click = FakeClick::on(&anchor);

    let outcome = app.provider.link_adapter().unwrap().handle_click(&click);
    assert_eq!(outcome, ClickOutcome::Intercepted);
    assert!(click.suppressed.get());
    assert_eq!(anchor.attribute(DEFAULT_PROCESSING_ATTRIBUTE).as_deref(), Some("true"));

    guard.accept();
    app.settle();
    assert_eq!(app.url(), "/profile");
    assert_eq!(anchor.attribute(DEFAULT_PROCESSING_ATTRIBUTE), None);
}

#[test]
fn test_modified_click_is_left_to_the_browser() {
    let app = TestApp::new(&["/"]);
    let _guard = app.scope().use_navigation_guard(GuardOptions::new()).unwrap();
    let mut click = FakeClick::on(&FakeAnchor::link("/profile"));
    click.modifiers.meta = true;

    let outcome = app.provider.link_adapter().unwrap().handle_click(&click);
    assert_eq!(outcome, ClickOutcome::Skipped(SkipReason::Modifier));
}

#[test]
fn test_unload_prompts_only_while_guarded() {
    let app = TestApp::with_config(&["/draft"], InterceptConfig::new().unload_message("Leave?"));
    let unload = app.provider.unload_adapter().unwrap().clone();

    let event = FakeUnload::default();
    assert!(!unload.on_before_unload(&event));

    let guard = app
        .scope()
        .use_navigation_guard(GuardOptions::new().enabled_when(|a| a.kind == NavigationType::Unload))
        .unwrap();
    let event = FakeUnload::default();
    assert!(unload.on_before_unload(&event));
    assert!(event.prevented.get());
    assert_eq!(event.message.borrow().as_deref(), Some("Leave?"));
    assert!(!guard.active());
}
