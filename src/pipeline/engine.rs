use crate::classifier::Classifier;
use crate::generator::PacketRateLimiter;
use crate::packet::{Packet, PacketResult};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::stage::{self, FlowRx, FlowTx};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Produces the next packet for a generator stage
pub type GenerateFn = Arc<dyn Fn() -> PacketResult<Packet> + Send + Sync>;

/// Inspects or rewrites a packet in place before passing it on
pub type HandleFn = Arc<dyn Fn(&mut Packet) + Send + Sync>;

/// Handle to a packet stream between two stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FlowId(usize);

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flow#{}", self.0)
    }
}

enum StagePlan {
    Generator {
        rate: PacketRateLimiter,
        generate: GenerateFn,
        output: FlowId,
    },
    Classifier {
        input: FlowId,
        classifier: Arc<dyn Classifier>,
        outputs: Vec<FlowId>,
    },
    Handler {
        input: FlowId,
        handler: HandleFn,
        output: FlowId,
    },
    Sink {
        input: FlowId,
    },
}

/// Pipeline under construction.
///
/// Every flow must end up with exactly one consumer before `start`.
pub struct Pipeline {
    stages: Vec<StagePlan>,
    consumed: Vec<bool>,
    capacity: usize,
}

impl Pipeline {
    pub fn new(capacity: usize) -> PipelineResult<Self> {
        if capacity == 0 {
            return Err(PipelineError::ZeroCapacity);
        }

        Ok(Self {
            stages: Vec::new(),
            consumed: Vec::new(),
            capacity,
        })
    }

    fn new_flow(&mut self) -> FlowId {
        self.consumed.push(false);
        FlowId(self.consumed.len() - 1)
    }

    fn consume(&mut self, flow: FlowId) -> PipelineResult<()> {
        match self.consumed.get_mut(flow.0) {
            None => Err(PipelineError::UnknownFlow(flow.0)),
            Some(true) => Err(PipelineError::FlowAlreadyConsumed(flow.0)),
            Some(slot) => {
                *slot = true;
                Ok(())
            }
        }
    }

    /// Add a generator paced at `rate` packets per second (0 = unlimited)
    pub fn set_generator(&mut self, rate: u64, generate: GenerateFn) -> FlowId {
        let output = self.new_flow();
        self.stages.push(StagePlan::Generator {
            rate: PacketRateLimiter::new(rate),
            generate,
            output,
        });
        output
    }

    /// Fan `input` out to one new flow per classifier output, in output order
    pub fn set_classifier(
        &mut self,
        input: FlowId,
        classifier: Arc<dyn Classifier>,
    ) -> PipelineResult<Vec<FlowId>> {
        if classifier.outputs().is_empty() {
            return Err(PipelineError::EmptyClassifier(classifier.name()));
        }
        self.consume(input)?;

        let outputs: Vec<FlowId> = (0..classifier.outputs().len())
            .map(|_| self.new_flow())
            .collect();
        self.stages.push(StagePlan::Classifier {
            input,
            classifier,
            outputs: outputs.clone(),
        });
        Ok(outputs)
    }

    pub fn set_handler(&mut self, input: FlowId, handler: HandleFn) -> PipelineResult<FlowId> {
        self.consume(input)?;
        let output = self.new_flow();
        self.stages.push(StagePlan::Handler {
            input,
            handler,
            output,
        });
        Ok(output)
    }

    /// Terminate a flow; packets reaching it are released
    pub fn set_stopper(&mut self, input: FlowId) -> PipelineResult<()> {
        self.consume(input)?;
        self.stages.push(StagePlan::Sink { input });
        Ok(())
    }

    /// Spawn one task per stage on the current tokio runtime
    pub fn start(self) -> PipelineResult<RunningPipeline> {
        if let Some(flow) = self.consumed.iter().position(|consumed| !consumed) {
            return Err(PipelineError::UnterminatedFlow(flow));
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| PipelineError::NoRuntime)?;

        let mut senders: Vec<Option<FlowTx>> = Vec::with_capacity(self.consumed.len());
        let mut receivers: Vec<Option<FlowRx>> = Vec::with_capacity(self.consumed.len());
        for _ in 0..self.consumed.len() {
            let (tx, rx) = mpsc::channel(self.capacity);
            senders.push(Some(tx));
            receivers.push(Some(rx));
        }
        let mut take_tx = |flow: FlowId| {
            senders[flow.0]
                .take()
                .ok_or(PipelineError::UnknownFlow(flow.0))
        };
        let mut take_rx = |flow: FlowId| {
            receivers[flow.0]
                .take()
                .ok_or(PipelineError::FlowAlreadyConsumed(flow.0))
        };

        let (stop_tx, stop_rx) = watch::channel(false);
        let (fatal_tx, fatal_rx) = mpsc::unbounded_channel();

        let mut tasks = Vec::with_capacity(self.stages.len());
        for plan in self.stages {
            let stop = stop_rx.clone();
            let task = match plan {
                StagePlan::Generator {
                    rate,
                    generate,
                    output,
                } => runtime.spawn(stage::run_generator(
                    rate,
                    generate,
                    take_tx(output)?,
                    fatal_tx.clone(),
                    stop,
                )),
                StagePlan::Classifier {
                    input,
                    classifier,
                    outputs,
                } => {
                    let outputs = outputs
                        .into_iter()
                        .map(&mut take_tx)
                        .collect::<PipelineResult<Vec<_>>>()?;
                    runtime.spawn(stage::run_classifier(classifier, take_rx(input)?, outputs, stop))
                }
                StagePlan::Handler {
                    input,
                    handler,
                    output,
                } => runtime.spawn(stage::run_handler(
                    handler,
                    take_rx(input)?,
                    take_tx(output)?,
                    stop,
                )),
                StagePlan::Sink { input } => runtime.spawn(stage::run_sink(take_rx(input)?, stop)),
            };
            tasks.push(task);
        }

        tracing::debug!(stages = tasks.len(), capacity = self.capacity, "Pipeline started");

        Ok(RunningPipeline {
            stop_tx,
            fatal_rx,
            tasks,
        })
    }
}

/// A started pipeline. Dropping it stops the stages without waiting for them.
pub struct RunningPipeline {
    stop_tx: watch::Sender<bool>,
    fatal_rx: mpsc::UnboundedReceiver<PipelineError>,
    tasks: Vec<JoinHandle<()>>,
}

impl RunningPipeline {
    /// Resolves with the first fatal stage error; pends forever if none occurs
    pub async fn failed(&mut self) -> PipelineError {
        match self.fatal_rx.recv().await {
            Some(err) => err,
            None => std::future::pending().await,
        }
    }

    /// Ask every stage to stop and wait for all of them to exit.
    ///
    /// A stage finishes the packet it is handling before it observes the
    /// stop, so no handler is interrupted half-way.
    pub async fn shutdown(self) -> PipelineResult<()> {
        let _ = self.stop_tx.send(true);

        let mut first_panic = None;
        for task in self.tasks {
            if let Err(e) = task.await {
                tracing::error!("Pipeline stage failed to join: {}", e);
                first_panic.get_or_insert_with(|| e.to_string());
            }
        }

        match first_panic {
            Some(msg) => Err(PipelineError::StagePanicked(msg)),
            None => {
                tracing::debug!("Pipeline stopped");
                Ok(())
            }
        }
    }
}
