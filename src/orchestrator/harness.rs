use crate::classifier::{Classifier, Output, Partitioner, RuleSet, Separator, Splitter};
use crate::config::HarnessConfig;
use crate::generator::Generator;
use crate::metrics::RunMetrics;
use crate::mode::{ModeProfile, TestMode};
use crate::orchestrator::error::{HarnessError, HarnessResult};
use crate::orchestrator::state_machine::RunStateMachine;
use crate::orchestrator::types::{RunEvent, RunState};
use crate::packet::{MacRewrite, MacTable, NonTestTraffic, Packet, SkipPredicate};
use crate::pipeline::{HandleFn, Pipeline, RunningPipeline};
use crate::rendezvous::Completion;
use crate::stats::{judge, Report, RunClock, Stats};
use crate::verifier::{LaneContext, LaneVerifier};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Runs one measurement from configuration to verdict
pub struct Harness {
    run_id: Uuid,
    config: HarnessConfig,
    state: RunStateMachine,
    skip: Arc<dyn SkipPredicate>,
}

/// What `configure` resolves before anything is wired
struct Plan {
    profile: Arc<ModeProfile>,
    classifier: Arc<dyn Classifier>,
}

impl Harness {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            config,
            state: RunStateMachine::new(),
            skip: Arc::new(NonTestTraffic),
        }
    }

    /// Replace the filter that keeps control traffic out of the counters
    pub fn with_skip_predicate(mut self, skip: Arc<dyn SkipPredicate>) -> Self {
        self.skip = skip;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn current_state(&self) -> RunState {
        self.state.current_state()
    }

    /// Execute the run once. A failed verdict is a report, not an error;
    /// only harness faults come back as `Err`.
    pub async fn run(&self) -> HarnessResult<Report> {
        let metrics = RunMetrics::start(self.config.mode);

        match self.execute().await {
            Ok(report) => {
                tracing::debug!(
                    run_id = %self.run_id,
                    elapsed_ms = metrics.elapsed().as_millis() as u64,
                    "Run finished"
                );
                metrics.finish(report.passed());
                Ok(report)
            }
            Err(e) => {
                tracing::error!(run_id = %self.run_id, "Run aborted: {}", e);
                let _ = self.state.transition(RunEvent::Fault {
                    reason: e.to_string(),
                });
                metrics.fail();
                Err(e)
            }
        }
    }

    async fn execute(&self) -> HarnessResult<Report> {
        let plan = self.configure()?;
        self.state.transition(RunEvent::Configured)?;

        let stats = Arc::new(Stats::new());
        let clock = Arc::new(RunClock::new(self.config.warmup()));
        let completion = Arc::new(Completion::new());
        let ctx = LaneContext {
            profile: plan.profile.clone(),
            stats: stats.clone(),
            clock: clock.clone(),
            completion: completion.clone(),
            skip: self.skip.clone(),
            budget: self.config.number,
        };

        let pipeline = self.build_pipeline(&plan, ctx)?;

        let started_at = Utc::now();
        clock.mark_started();
        let mut running = pipeline.start()?;
        self.state.transition(RunEvent::Started)?;
        tracing::debug!(
            run_id = %self.run_id,
            warmup_ms = clock.warmup().as_millis() as u64,
            "Pipeline started"
        );

        self.state.transition(RunEvent::Waiting)?;
        let waited = self.await_completion(&completion, &mut running).await;
        // stages finish the packet in hand, so no counted packet is in flight past here
        running.shutdown().await?;
        waited?;
        self.state.transition(RunEvent::BudgetReached)?;

        let snapshot = stats.snapshot();
        let judgement = judge(&snapshot, &plan.profile, self.config.passed_limit)?;
        let report = Report::new(
            self.run_id,
            self.config.mode,
            started_at,
            (self.config.ports.inport1, self.config.ports.inport2),
            judgement,
        );
        self.state.transition(RunEvent::Judged {
            passed: report.passed(),
        })?;

        if report.passed() {
            tracing::info!(run_id = %self.run_id, mode = %self.config.mode, "Test passed");
        } else {
            for violation in &report.judgement.violations {
                tracing::warn!(run_id = %self.run_id, "Check failed: {}", violation);
            }
        }

        Ok(report)
    }

    /// Resolve the mode profile and the classifier, loading rules if the mode needs them
    fn configure(&self) -> HarnessResult<Plan> {
        self.config.validate()?;
        let profile = Arc::new(self.config.mode_profile()?);

        let classifier: Arc<dyn Classifier> = match self.config.mode {
            TestMode::Separate => Arc::new(Separator::new(self.load_rules()?)),
            TestMode::Split => Arc::new(Splitter::new(self.load_rules()?, Splitter::MIN_OUTPUTS)?),
            TestMode::Partition => {
                let partitioner = Partitioner::new(
                    self.config.partition.first,
                    self.config.partition.second,
                    self.config.partition.seed,
                )?;
                tracing::debug!(
                    first_share = partitioner.first_share(),
                    "Partition weights resolved"
                );
                Arc::new(partitioner)
            }
        };

        let bounds = profile.first_lane_bounds();
        tracing::info!(
            run_id = %self.run_id,
            mode = %profile.mode(),
            classifier = classifier.name(),
            budget = self.config.number,
            speed = self.config.speed,
            expected = profile.expected_percent(),
            low = bounds.low,
            high = bounds.high,
            "Run configured"
        );

        Ok(Plan {
            profile,
            classifier,
        })
    }

    fn load_rules(&self) -> HarnessResult<Arc<RuleSet>> {
        let path = self.config.rules_path().ok_or_else(|| {
            HarnessError::Config(crate::config::ConfigError::invalid(
                "rules",
                format!("mode {} needs a rule file", self.config.mode),
            ))
        })?;
        let rules = RuleSet::load(&path)?;
        tracing::debug!(path = %path.display(), rules = rules.rules().len(), "Rule set loaded");
        Ok(Arc::new(rules))
    }

    /// Generator -> classifier -> per lane (MAC fix-up -> verifier -> stopper).
    /// Classifier outputs that are not observed lanes drain into a stopper.
    fn build_pipeline(&self, plan: &Plan, ctx: LaneContext) -> HarnessResult<Pipeline> {
        let effects = MacTable::from_entries(&self.config.macs)
            .lane_effects(self.config.ports.outport1, self.config.ports.outport2);

        let generator = Generator::new(
            plan.profile.clone(),
            ctx.stats.clone(),
            ctx.clock.clone(),
            effects.egress,
            self.config.payload_size,
            self.config.number,
        );

        let mut pipeline = Pipeline::new(self.config.channel_capacity)?;
        let flow = pipeline.set_generator(self.config.speed, Arc::new(move || generator.generate()));
        let lanes = pipeline.set_classifier(flow, plan.classifier.clone())?;

        for (flow, output) in lanes.into_iter().zip(plan.classifier.outputs()) {
            match *output {
                Output::Sink => pipeline.set_stopper(flow)?,
                Output::Observed(lane) => {
                    let fixup = mac_fixup(effects.for_lane(lane), self.skip.clone());
                    let flow = pipeline.set_handler(flow, fixup)?;

                    let verifier = LaneVerifier::new(lane, ctx.clone());
                    let flow = pipeline.set_handler(
                        flow,
                        Arc::new(move |packet: &mut Packet| {
                            verifier.verify(packet);
                        }),
                    )?;
                    pipeline.set_stopper(flow)?;
                }
            }
        }

        Ok(pipeline)
    }

    async fn await_completion(
        &self,
        completion: &Completion,
        running: &mut RunningPipeline,
    ) -> HarnessResult<()> {
        let deadline = self.config.deadline();
        let expired = async {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = completion.wait() => Ok(()),
            err = running.failed() => Err(HarnessError::Pipeline(err)),
            _ = expired => Err(HarnessError::Timeout(deadline.unwrap_or(Duration::ZERO))),
        }
    }
}

/// Rewrite Ethernet addresses for the lane's output port, leaving control traffic alone
fn mac_fixup(rewrite: MacRewrite, skip: Arc<dyn SkipPredicate>) -> HandleFn {
    Arc::new(move |packet: &mut Packet| {
        if !skip.should_skip(packet) {
            rewrite.apply(packet);
        }
    })
}
