use super::*;

const MS: Duration = Duration::from_millis(1);

#[test]
fn busy_host_defers_until_deadline() {
    let t0 = Instant::now();
    let mut q = IdleQueue::default();
    let deadline = q.push("palette", t0);
    assert_eq!(deadline, t0 + 500 * MS);

    assert!(q.take_ready(t0 + 100 * MS, false).is_none());
    assert!(q.take_ready(t0 + 499 * MS, false).is_none());
    let task = q.take_ready(t0 + 500 * MS, false).unwrap();
    assert_eq!(task.job, "palette");
    assert!(q.is_empty());
}

#[test]
fn idle_host_runs_immediately_in_fifo_order() {
    let t0 = Instant::now();
    let mut q = IdleQueue::new(500 * MS);
    q.push(1, t0);
    q.push(2, t0 + 10 * MS);
    assert_eq!(q.take_ready(t0, true).map(|t| t.job), Some(1));
    assert_eq!(q.next_deadline(), Some(t0 + 510 * MS));
    assert_eq!(q.take_ready(t0, true).map(|t| t.job), Some(2));
    assert!(q.take_ready(t0, true).is_none());
}

#[test]
fn deadline_follows_the_front_job() {
    let t0 = Instant::now();
    let mut q = IdleQueue::new(100 * MS);
    assert_eq!(q.next_deadline(), None);
    q.push("a", t0);
    q.push("b", t0 + 50 * MS);
    assert_eq!(q.len(), 2);
    assert_eq!(q.next_deadline(), Some(t0 + 100 * MS));
    assert_eq!(q.take_ready(t0 + 100 * MS, false).map(|t| t.job), Some("a"));
    assert!(q.take_ready(t0 + 120 * MS, false).is_none());
    assert_eq!(q.next_deadline(), Some(t0 + 150 * MS));
}
