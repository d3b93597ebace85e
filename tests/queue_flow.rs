use hopwire::queue::{PipeConfig, PipeKind, QueueLimits, QueueSetConfig, RxMode};
use hopwire::{
    Envelope, Error, HEADER_SIZE, MessageBuffer, PipeTable, Priority, QueueSet, WireRecord,
    metrics_snapshot,
};

fn message(priority: Priority, payload: &[u8]) -> MessageBuffer {
    let mut message = MessageBuffer::create(HEADER_SIZE + 256).unwrap();
    message
        .update_header(|header| {
            header.set_priority_level(priority);
            header.set_dst_id(42);
            Ok(())
        })
        .unwrap();
    message
        .append_record(&WireRecord::with_payload(1, payload.to_vec()).unwrap())
        .unwrap();
    message
}

fn envelope(id: u32, priority: Priority, payload: &[u8]) -> Envelope {
    let mut envelope = Envelope::new();
    envelope.set_id(id);
    envelope.bind(message(priority, payload), 1).unwrap();
    envelope
}

#[test]
fn relay_between_pipes() {
    let mut table = PipeTable::new();
    let config = PipeConfig::default();
    let inbound = table.open(PipeKind::User, &config).unwrap();
    let outbound = table.open(PipeKind::User, &config).unwrap();

    let node = table.get_mut(inbound).unwrap();
    node.submit(envelope(1, Priority::Low, b"first")).unwrap();
    node.submit(envelope(2, Priority::Level4, b"urgent")).unwrap();
    node.submit(envelope(3, Priority::Low, b"second")).unwrap();

    // drain the high queue first, then the low one, moving each buffer into a
    // fresh envelope on the outbound pipe
    let mut relayed = Vec::new();
    for index in (0..node.rx().len()).rev() {
        while let Ok(mut received) = node.receive(index) {
            relayed.push((received.id(), received.unbind().unwrap()));
        }
    }
    assert_eq!(node.rx().total_count(), 0);

    let forward = table.get_mut(outbound).unwrap();
    for (id, buffer) in relayed {
        let mut next = Envelope::new();
        next.set_id(id);
        next.bind(buffer, 1).unwrap();
        forward.send(next).unwrap();
    }

    let mut sent = Vec::new();
    for index in (0..forward.tx().len()).rev() {
        while let Ok(mut envelope) = forward.transmit(index) {
            let buffer = envelope.unbind().unwrap();
            assert_eq!(buffer.dst_id(), 42);
            sent.push(buffer.last_record().unwrap().data().to_vec());
        }
    }
    assert_eq!(sent, vec![b"urgent".to_vec(), b"first".to_vec(), b"second".to_vec()]);
}

#[test]
fn capped_queue_set_hands_back_overflow() {
    let config = QueueSetConfig {
        queue_count: 5,
        limits: QueueLimits {
            max_count: 2,
            ..QueueLimits::default()
        },
        rx_mode: RxMode::Full,
    };
    let mut set = QueueSet::with_config(&config).unwrap();
    assert!(set.iter().all(|queue| queue.rx_mode() == RxMode::Full));

    set.dispatch(envelope(1, Priority::Level2, b"a")).unwrap();
    set.dispatch(envelope(2, Priority::Level2, b"b")).unwrap();
    let rejected = set.dispatch(envelope(3, Priority::Level2, b"c")).unwrap_err();
    assert!(matches!(rejected.error(), Error::OutOfRange { .. }));

    // the refused envelope can go elsewhere
    let retry = rejected.into_inner();
    assert_eq!(retry.id(), 3);
    assert_eq!(retry.select_queue(set.len()), 2);
    let mut other = QueueSet::new(1).unwrap();
    assert_eq!(other.dispatch(retry).unwrap(), 0);

    assert_eq!(set.total_count(), 2);
    assert_eq!(set.queue(2).unwrap().count(), 2);
    assert_eq!(set.destroy().len(), 2);
    assert_eq!(other.destroy().len(), 1);
}

#[test]
fn metrics_count_admissions() {
    let before = metrics_snapshot();

    let mut set = QueueSet::new(2).unwrap();
    set.dispatch(envelope(1, Priority::Level1, b"x")).unwrap();
    set.dispatch(Envelope::new()).unwrap_err();
    set.take(1).unwrap();

    // other tests share the counters, so compare lower bounds only
    let after = metrics_snapshot();
    assert!(after.admitted > before.admitted);
    assert!(after.dequeued > before.dequeued);
    assert!(after.rejected_empty > before.rejected_empty);
    assert!(after.dispatched_by_index[1] > before.dispatched_by_index[1]);
    assert!(after.bytes_admitted >= before.bytes_admitted + (HEADER_SIZE as u64 + 256));
}
