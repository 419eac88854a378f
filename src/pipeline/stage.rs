use crate::classifier::Classifier;
use crate::generator::PacketRateLimiter;
use crate::packet::Packet;
use crate::pipeline::engine::{GenerateFn, HandleFn};
use crate::pipeline::error::PipelineError;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};

pub(crate) type FlowTx = mpsc::Sender<Packet>;
pub(crate) type FlowRx = mpsc::Receiver<Packet>;

/// Forward a packet downstream unless the pipeline is stopping.
/// Returns false when the stage should exit.
async fn forward(tx: &FlowTx, packet: Packet, stop: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        biased;
        _ = stop.changed() => false,
        sent = tx.send(packet) => sent.is_ok(),
    }
}

/// Next packet from upstream, or `None` once stopping or upstream is gone
async fn next(rx: &mut FlowRx, stop: &mut watch::Receiver<bool>) -> Option<Packet> {
    tokio::select! {
        biased;
        _ = stop.changed() => None,
        packet = rx.recv() => packet,
    }
}

pub(crate) async fn run_generator(
    rate: PacketRateLimiter,
    generate: GenerateFn,
    tx: FlowTx,
    fatal: mpsc::UnboundedSender<PipelineError>,
    mut stop: watch::Receiver<bool>,
) {
    let mut emitted = 0u64;
    tracing::debug!(paced = rate.is_enabled(), "Generator stage started");

    while !*stop.borrow() {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            _ = rate.wait_for_packet() => {}
        }

        let packet = match generate() {
            Ok(packet) => packet,
            Err(e) => {
                tracing::error!("Failed to create new packet: {}", e);
                let _ = fatal.send(PipelineError::GeneratorFailed(e));
                break;
            }
        };
        emitted += 1;

        if !forward(&tx, packet, &mut stop).await {
            break;
        }
    }

    tracing::debug!(emitted, "Generator stage exited");
}

pub(crate) async fn run_classifier(
    classifier: Arc<dyn Classifier>,
    mut rx: FlowRx,
    outputs: Vec<FlowTx>,
    mut stop: watch::Receiver<bool>,
) {
    let mut out_of_range = 0u64;

    while let Some(packet) = next(&mut rx, &mut stop).await {
        let idx = classifier.classify(&packet);
        match outputs.get(idx) {
            Some(tx) => {
                if !forward(tx, packet, &mut stop).await {
                    break;
                }
            }
            None => out_of_range += 1,
        }
    }

    if out_of_range > 0 {
        tracing::warn!(
            classifier = classifier.name(),
            out_of_range,
            "Dropped packets classified past the last output"
        );
    }
    tracing::debug!(classifier = classifier.name(), "Classifier stage exited");
}

pub(crate) async fn run_handler(
    handler: HandleFn,
    mut rx: FlowRx,
    tx: FlowTx,
    mut stop: watch::Receiver<bool>,
) {
    while let Some(mut packet) = next(&mut rx, &mut stop).await {
        handler(&mut packet);
        if !forward(&tx, packet, &mut stop).await {
            break;
        }
    }
}

pub(crate) async fn run_sink(mut rx: FlowRx, mut stop: watch::Receiver<bool>) {
    let mut drained = 0u64;
    while next(&mut rx, &mut stop).await.is_some() {
        drained += 1;
    }
    tracing::debug!(drained, "Sink stage exited");
}
