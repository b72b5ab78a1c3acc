use super::*;

const MS: Duration = Duration::from_millis(1);

/// Drive the scheduler until `end`, stepping 1 ms, and count redraws.
fn run_until(s: &mut RenderScheduler, from: Instant, end: Instant) -> u64 {
    let before = s.renders();
    let mut now = from;
    while now <= end {
        if s.poll(now).is_some() {
            s.complete(now);
        }
        now += MS;
    }
    s.renders() - before
}

#[test]
fn burst_within_debounce_window_renders_once() {
    let t0 = Instant::now();
    let mut s = RenderScheduler::new(t0, RenderScale::ONE, RedrawPolicy::Debounced);
    for i in 0..10u32 {
        s.invalidate(t0 + i * 20 * MS, Urgency::Coalesce);
        assert!(s.poll(t0 + i * 20 * MS).is_none());
    }
    // last invalidation at 180 ms, due at 260 ms
    assert_eq!(s.next_deadline(), Some(t0 + 260 * MS));
    assert!(s.poll(t0 + 259 * MS).is_none());
    assert_eq!(run_until(&mut s, t0 + 259 * MS, t0 + 2000 * MS), 1);
}

#[test]
fn spaced_invalidations_render_each_time() {
    let t0 = Instant::now();
    let mut s = RenderScheduler::new(t0, RenderScale::ONE, RedrawPolicy::Debounced);
    let n = 5u32;
    for i in 0..n {
        let at = t0 + i * 200 * MS;
        s.invalidate(at, Urgency::Coalesce);
        run_until(&mut s, at, at + 150 * MS);
    }
    assert_eq!(s.renders(), u64::from(n));
    assert_eq!(s.state(), SchedulerState::Idle);
}

#[test]
fn immediate_is_due_after_short_delay() {
    let t0 = Instant::now();
    let mut s = RenderScheduler::new(t0, RenderScale::ONE, RedrawPolicy::Debounced);
    s.invalidate(t0, Urgency::Immediate);
    assert!(s.poll(t0 + 7 * MS).is_none());
    let ticket = s.poll(t0 + 8 * MS).unwrap();
    assert_eq!(ticket.scale, RenderScale::ONE);
    assert!((ticket.phase - 0.008).abs() < 1e-9);
    assert_eq!(s.state(), SchedulerState::Running);
}

#[test]
fn later_request_replaces_earlier_timer() {
    let t0 = Instant::now();
    let mut s = RenderScheduler::new(t0, RenderScale::ONE, RedrawPolicy::Debounced);
    s.invalidate(t0, Urgency::Coalesce);
    s.invalidate(t0 + 5 * MS, Urgency::Immediate);
    assert_eq!(s.next_deadline(), Some(t0 + 13 * MS));
}

#[test]
fn invalidation_while_running_is_served_after_completion() {
    let t0 = Instant::now();
    let mut s = RenderScheduler::new(t0, RenderScale::ONE, RedrawPolicy::Debounced);
    s.invalidate(t0, Urgency::Immediate);
    assert!(s.poll(t0 + 8 * MS).is_some());
    s.invalidate(t0 + 9 * MS, Urgency::Coalesce);
    s.invalidate(t0 + 10 * MS, Urgency::Immediate);
    assert_eq!(s.state(), SchedulerState::Running);
    assert!(s.poll(t0 + 10 * MS).is_none());

    s.complete(t0 + 20 * MS);
    assert_eq!(s.state(), SchedulerState::Pending { due: t0 + 28 * MS });
    assert_eq!(run_until(&mut s, t0 + 20 * MS, t0 + 500 * MS), 1);
    assert_eq!(s.renders(), 2);
}

#[test]
fn restore_is_scheduled_sixteen_ms_out() {
    let t0 = Instant::now();
    let mut s = RenderScheduler::new(t0, RenderScale::ONE, RedrawPolicy::Debounced);
    s.schedule_restore(t0);
    assert_eq!(s.next_deadline(), Some(t0 + 16 * MS));
}

#[test]
fn ticket_carries_current_preview_scale() {
    let t0 = Instant::now();
    let mut s = RenderScheduler::new(t0, RenderScale::ONE, RedrawPolicy::Debounced);
    let two = RenderScale::new(2.0).unwrap();
    s.set_scale(two);
    s.invalidate(t0, Urgency::Immediate);
    assert_eq!(s.poll(t0 + 8 * MS).map(|t| t.scale), Some(two));
}

#[test]
fn animated_policy_draws_once_per_tick() {
    let t0 = Instant::now();
    let mut s = RenderScheduler::new(t0, RenderScale::ONE, RedrawPolicy::animated());
    assert!(s.poll(t0).is_some());
    s.complete(t0);
    assert_eq!(s.next_deadline(), Some(t0 + 33 * MS));

    // invalidations do not add frames between ticks
    s.invalidate(t0 + 5 * MS, Urgency::Immediate);
    s.invalidate(t0 + 6 * MS, Urgency::Coalesce);
    assert!(s.poll(t0 + 20 * MS).is_none());

    // ticks at 33, 66, 99 ... 330
    assert_eq!(run_until(&mut s, t0 + MS, t0 + 330 * MS), 10);
}

#[test]
fn animated_phase_advances() {
    let t0 = Instant::now();
    let mut s = RenderScheduler::new(t0, RenderScale::ONE, RedrawPolicy::animated());
    let a = s.poll(t0).unwrap().phase;
    s.complete(t0);
    let b = s.poll(t0 + 33 * MS).unwrap().phase;
    assert!(b > a);
}
