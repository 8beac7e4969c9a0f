//! Sequential plan submission.

use crate::error::RunError;
use crate::plan::ExecutionPlan;
use chrono::{DateTime, Utc};
use nlswap_protocols::{ContractWriter, TxHash};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// A confirmed plan step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReceipt {
    pub function: String,
    pub address: String,
    pub tx: TxHash,
    pub confirmed_at: DateTime<Utc>,
}

/// Outcome of a fully executed plan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub plan_id: Uuid,
    pub steps: Vec<StepReceipt>,
}

/// Submits plan calls one at a time.
///
/// Each call is confirmed before the next is sent, so the router call only goes
/// out once its approvals are mined. Failures are returned as-is and never
/// resubmitted.
pub struct PlanRunner {
    writer: Arc<dyn ContractWriter>,
}

impl PlanRunner {
    pub fn new(writer: Arc<dyn ContractWriter>) -> Self {
        Self { writer }
    }

    /// Runs `plan` to completion or to its first failure.
    ///
    /// # Errors
    /// Returns a [`RunError`] naming the failing step and the steps confirmed
    /// before it.
    pub async fn run(&self, plan: &ExecutionPlan) -> Result<RunReport, RunError> {
        info!(plan_id = %plan.id, calls = plan.call_count(), "Running plan");
        let mut steps = Vec::with_capacity(plan.call_count());

        for (index, call) in plan.calls().enumerate() {
            let outcome = match self.writer.write_contract(call).await {
                Ok(tx) => self
                    .writer
                    .wait_for_confirmation(&tx)
                    .await
                    .map(|()| tx),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(tx) => {
                    info!(plan_id = %plan.id, step = index, function = %call.function, tx = %tx, "Step confirmed");
                    steps.push(StepReceipt {
                        function: call.function.clone(),
                        address: call.address.clone(),
                        tx,
                        confirmed_at: Utc::now(),
                    });
                }
                Err(source) => {
                    error!(
                        plan_id = %plan.id,
                        step = index,
                        function = %call.function,
                        error = %source,
                        "Step failed"
                    );
                    return Err(RunError {
                        step: index,
                        function: call.function.clone(),
                        completed: steps,
                        source,
                    });
                }
            }
        }

        Ok(RunReport {
            plan_id: plan.id,
            steps,
        })
    }
}
