//! Minimal mock resource driven by the batch coordinator.
//!
//! Every job reports `queued`, then `ongoing`, then `finished` on successive
//! polls. Circuits wider than the mock's register fail remotely.

use std::collections::HashMap;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hal_batch::transpile::normalize;
use hal_batch::{
    BatchJob, Circuit, CoordinatorConfig, HalError, HalResult, JobId, NativeCircuit, PollResponse,
    Resource,
};
use tracing_subscriber::EnvFilter;

/// Remote view of one submitted circuit.
struct MockJob {
    polls: u32,
    num_qubits: u32,
    shots: u32,
}

/// In-memory mock resource.
struct MockResource {
    num_qubits: u32,
    jobs: Mutex<HashMap<String, MockJob>>,
    next_id: Mutex<u64>,
}

impl MockResource {
    fn new(num_qubits: u32) -> Self {
        Self {
            num_qubits,
            jobs: Mutex::new(HashMap::new()),
            next_id: Mutex::new(0),
        }
    }

    /// Alternate between all-zero and all-one shots.
    fn samples(job: &MockJob) -> Vec<Vec<u8>> {
        (0..job.shots)
            .map(|shot| vec![u8::from(shot % 2 == 1); job.num_qubits as usize])
            .collect()
    }
}

#[async_trait]
impl Resource<NativeCircuit> for MockResource {
    fn name(&self) -> &str {
        "default/mock_simulator"
    }

    async fn submit_unit(&self, circuit: &NativeCircuit, shots: u32) -> HalResult<JobId> {
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            format!("mock-{}", *next)
        };

        self.jobs.lock().unwrap().insert(
            id.clone(),
            MockJob {
                polls: 0,
                num_qubits: circuit.num_qubits(),
                shots,
            },
        );

        Ok(JobId::new(id))
    }

    async fn poll_unit(&self, job_id: &JobId) -> HalResult<PollResponse> {
        let mut jobs = self.jobs.lock().unwrap();
        let Some(job) = jobs.get_mut(&job_id.0) else {
            return Err(HalError::JobNotFound(job_id.to_string()));
        };
        job.polls += 1;

        let response = match job.polls {
            1 => PollResponse::queued(),
            2 => PollResponse::ongoing(),
            _ if job.num_qubits > self.num_qubits => PollResponse::error(format!(
                "circuit requires {} qubits, resource has {}",
                job.num_qubits, self.num_qubits
            )),
            _ => PollResponse::finished(Self::samples(job)),
        };
        Ok(response)
    }
}

fn bell() -> NativeCircuit {
    let mut qc = NativeCircuit::new("bell", 2, 2);
    qc.r(FRAC_PI_2, FRAC_PI_2, 0)
        .rxx(FRAC_PI_4, 0, 1)
        .rx(-FRAC_PI_2, 0)
        .measure_all();
    qc
}

fn ghz(n: u32) -> NativeCircuit {
    let mut qc = NativeCircuit::new(format!("ghz-{n}"), n, n);
    qc.r(FRAC_PI_2, FRAC_PI_2, 0);
    for q in 1..n {
        // out-of-band angle, wrapped by normalize()
        qc.rxx(PI + FRAC_PI_4, 0, q);
    }
    qc.measure_all();
    qc
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let resource = Arc::new(MockResource::new(4));
    let circuits: Vec<NativeCircuit> = [bell(), ghz(3), ghz(6)].iter().map(normalize).collect();

    println!("Resource: {}", resource.name());
    for circuit in &circuits {
        println!(
            "  {:<6} {} qubits, {} operations",
            circuit.name,
            circuit.num_qubits,
            circuit.operations.len()
        );
    }
    println!();

    // HAL_BATCH_* variables tune polling
    let config = CoordinatorConfig::from_env();
    let (interval, deadline) = (config.poll_interval, config.wait_timeout);
    let batch = BatchJob::new(resource, circuits, 100)?.with_config(config);

    batch.submit().await?;
    let status = batch.wait_for_completion(interval, deadline).await?;
    println!("Batch {}: {status}", batch.id());

    let result = batch.collect_result()?;
    for unit in &result.units {
        println!("Unit {} ({}): {}", unit.ordinal, unit.header.name, unit.status);
        if let Some(counts) = &unit.counts {
            for (key, count) in counts.sorted() {
                println!("  {key:>5}: {count}");
            }
        }
        if let Some(error) = &unit.error {
            println!("  error: {error}");
        }
    }

    println!();
    println!("Success: {}", result.success);
    Ok(())
}
