use super::*;

#[test]
fn ungated_targets_admit_freely() -> Result<()> {
    let (mut page, button) = page_with_button();

    for _ in 0..10 {
        page.add_event_listener(button, "click", &Listener::noop(), opts())?;
    }
    assert_eq!(page.listener_count(button, "click")?, 10);
    assert_eq!(page.gate_cap(button)?, None);
    assert_eq!(page.gate_admitted(button)?, None);
    Ok(())
}

#[test]
fn full_gate_rejects_without_touching_listeners() -> Result<()> {
    let (mut page, button) = page_with_button();
    page.install_gate(button, 2)?;

    page.add_event_listener(button, "click", &Listener::noop(), opts())?;
    page.add_event_listener(button, "keydown", &Listener::noop(), opts())?;

    let err = page
        .add_event_listener(button, "click", &Listener::noop(), opts())
        .unwrap_err();
    assert_eq!(
        err,
        Error::CapacityExceeded {
            target: button,
            cap: 2
        }
    );
    assert_eq!(page.total_listener_count(button)?, 2);
    assert_eq!(page.gate_admitted(button)?, Some(2));
    Ok(())
}

#[test]
fn gate_counts_duplicates_before_dedupe() -> Result<()> {
    let (mut page, button) = page_with_button();
    let listener = Listener::noop();
    page.install_gate(button, 1)?;

    page.add_event_listener(button, "click", &listener, opts())?;

    // The re-add would dedupe, but the gate is already full and wins.
    let err = page
        .add_event_listener(button, "click", &listener, opts())
        .unwrap_err();
    assert_eq!(
        err,
        Error::CapacityExceeded {
            target: button,
            cap: 1
        }
    );
    Ok(())
}

#[test]
fn raising_the_cap_reopens_the_gate() -> Result<()> {
    let (mut page, button) = page_with_button();
    page.install_gate(button, 1)?;

    page.add_event_listener(button, "click", &Listener::noop(), opts())?;
    assert!(page
        .add_event_listener(button, "click", &Listener::noop(), opts())
        .is_err());

    page.install_gate(button, 2)?;
    page.add_event_listener(button, "click", &Listener::noop(), opts())?;
    assert_eq!(page.listener_count(button, "click")?, 2);
    assert_eq!(page.gate_admitted(button)?, Some(2));
    Ok(())
}

#[test]
fn raising_the_cap_preserves_admissions() -> Result<()> {
    let (mut page, button) = page_with_button();
    page.install_gate(button, 3)?;

    page.add_event_listener(button, "click", &Listener::noop(), opts())?;
    page.install_gate(button, 5)?;

    assert_eq!(page.gate_cap(button)?, Some(5));
    assert_eq!(page.gate_admitted(button)?, Some(1));
    Ok(())
}

#[test]
fn dedupe_requires_same_listener_and_capture_flag() -> Result<()> {
    let (mut page, button) = page_with_button();
    let listener = Listener::noop();
    let capture = ListenerOptions {
        capture: true,
        ..ListenerOptions::default()
    };

    page.add_event_listener(button, "click", &listener, opts())?;
    page.add_event_listener(button, "click", &listener, opts())?;
    assert_eq!(page.listener_count(button, "click")?, 1);

    page.add_event_listener(button, "click", &listener, capture)?;
    assert_eq!(page.listener_count(button, "click")?, 2);

    // Distinct closures are distinct identities even with equal bodies.
    page.add_event_listener(button, "click", &Listener::noop(), opts())?;
    assert_eq!(page.listener_count(button, "click")?, 3);
    Ok(())
}

#[test]
fn counts_are_per_target_and_per_type() -> Result<()> {
    let mut page = Page::new();
    let button = page.create_element("button");
    let input = page.create_element("input");

    page.add_event_listener(button, "click", &Listener::noop(), opts())?;
    page.add_event_listener(button, "keydown", &Listener::noop(), opts())?;
    page.add_event_listener(input, "click", &Listener::noop(), opts())?;

    assert_eq!(page.listener_count(button, "click")?, 1);
    assert_eq!(page.listener_count(button, "keydown")?, 1);
    assert_eq!(page.listener_count(button, "change")?, 0);
    assert_eq!(page.total_listener_count(button)?, 2);
    assert_eq!(page.total_listener_count(input)?, 1);
    Ok(())
}

#[test]
fn missing_targets_error_on_every_operation() -> Result<()> {
    let mut page = Page::new();
    let stray = TargetId(42);

    assert_eq!(
        page.add_event_listener(stray, "click", &Listener::noop(), opts()),
        Err(Error::TargetNotFound(stray))
    );
    assert_eq!(
        page.remove_event_listener(stray, "click", &Listener::noop(), opts()),
        Err(Error::TargetNotFound(stray))
    );
    assert_eq!(page.dispatch(stray, "click"), Err(Error::TargetNotFound(stray)));
    assert_eq!(page.listener_count(stray, "click"), Err(Error::TargetNotFound(stray)));
    assert_eq!(page.gate_cap(stray), Err(Error::TargetNotFound(stray)));
    Ok(())
}

#[test]
fn trace_captures_gate_activity() -> Result<()> {
    let (mut page, button) = page_with_button();
    page.enable_trace(true);
    page.set_trace_stderr(false);

    page.install_gate(button, 1)?;
    page.add_event_listener(button, "click", &Listener::noop(), opts())?;
    let _ = page.add_event_listener(button, "click", &Listener::noop(), opts());

    let logs = page.take_trace_logs();
    assert_eq!(logs.len(), 3);
    assert!(logs[0].starts_with("[gate]"), "unexpected log: {}", logs[0]);
    assert!(logs[0].contains("cap=1"));
    assert!(logs[1].contains("gate=1/1"));
    assert!(logs[2].contains("rejected"));

    // Draining leaves the buffer empty.
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}

#[test]
fn trace_captures_remove_and_dispatch() -> Result<()> {
    let (mut page, button) = page_with_button();
    let listener = Listener::noop();
    page.add_event_listener(button, "click", &listener, opts())?;
    page.enable_trace(true);
    page.set_trace_stderr(false);

    page.dispatch(button, "click")?;
    page.remove_event_listener(button, "click", &listener, opts())?;
    // A second removal finds nothing and still leaves a line.
    page.remove_event_listener(button, "click", &listener, opts())?;

    let logs = page.take_trace_logs();
    assert_eq!(logs.len(), 3);
    assert!(logs[0].starts_with("[dispatch]"), "unexpected log: {}", logs[0]);
    assert!(logs[0].contains("fired=1"));
    assert!(logs[1].starts_with("[listener] remove"), "unexpected log: {}", logs[1]);
    assert!(logs[1].contains("removed=true"));
    assert!(logs[2].contains("removed=false"));
    Ok(())
}

#[test]
fn trace_log_limit_keeps_the_tail() -> Result<()> {
    let (mut page, button) = page_with_button();
    page.enable_trace(true);
    page.set_trace_stderr(false);
    page.set_trace_log_limit(2);

    for _ in 0..5 {
        page.add_event_listener(button, "click", &Listener::noop(), opts())?;
    }

    let logs = page.take_trace_logs();
    assert_eq!(logs.len(), 2);
    Ok(())
}

#[test]
fn trace_is_silent_by_default() -> Result<()> {
    let (mut page, button) = page_with_button();
    page.add_event_listener(button, "click", &Listener::noop(), opts())?;
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}
