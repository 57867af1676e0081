use crate::job::Job;
use crate::spawn::{ForkExec, PreparedStage, Spawner, StageIo};
use crate::types::Pipeline;

use std::ffi;
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use nix::fcntl::OFlag;
use nix::unistd;
use log::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum ExecError {
	#[error("system call failed")]
	NixError(#[from] nix::Error),
	#[error("argument contains a NUL byte")]
	NulError(#[from] ffi::NulError),
	#[error("empty command in stage {}", .index + 1)]
	EmptyStage { index: usize },
}

pub struct Executor<S: Spawner> {
	spawner: S,
}

impl Executor<ForkExec> {
	pub fn fork_exec() -> Executor<ForkExec> {
		Executor::new(ForkExec)
	}
}

impl<S: Spawner> Executor<S> {
	pub fn new(spawner: S) -> Executor<S> {
		Executor { spawner: spawner }
	}

	pub fn run(&mut self, pipeline: &Pipeline) -> Result<Job, ExecError> {
		self.run_with(pipeline, None, None)
	}

	/// `source` feeds the first stage and `sink` takes the last stage's output.
	/// Both should be close-on-exec: earlier stages are forked while they are open.
	pub fn run_with(&mut self, pipeline: &Pipeline, source: Option<OwnedFd>, sink: Option<OwnedFd>)
	                -> Result<Job, ExecError> {
		let stages = prepare(pipeline)?;
		let mut job = Job::with_capacity(stages.len());
		if stages.is_empty() {
			return Ok(job);
		}

		if let Err(e) = self.spawn_stages(&stages, source, sink, &mut job) {
			warn!("aborting pipeline after {} of {} stage(s): {}", job.len(), stages.len(), e);
			self.abort(&mut job);
			return Err(e);
		}
		self.wait_all(&mut job)?;
		Ok(job)
	}

	fn spawn_stages(&mut self, stages: &[PreparedStage], source: Option<OwnedFd>, sink: Option<OwnedFd>,
	                job: &mut Job) -> Result<(), ExecError> {
		let last = stages.len() - 1;
		let mut input = source;
		let mut sink = sink;

		for (i, stage) in stages.iter().enumerate() {
			let (next_input, output) = if i < last {
				let (pipe_read, pipe_write) = unistd::pipe2(OFlag::O_CLOEXEC)?;
				debug!("stage {}: pipe {} <- {}", i, pipe_read.as_raw_fd(), pipe_write.as_raw_fd());
				(Some(pipe_read), Some(pipe_write))
			} else {
				(None, sink.take())
			};

			let io = StageIo {
				stdin: input.as_ref().map(|fd| fd.as_fd()),
				stdout: output.as_ref().map(|fd| fd.as_fd()),
				unused: next_input.as_ref().map(|fd| fd.as_fd()),
			};
			let pid = self.spawner.spawn(stage, io)?;
			job.push(pid);
			debug!("stage {}: {:?} is pid {}", i, stage.program(), pid);

			// The child owns these copies now; the parent keeps only the next read end.
			drop(input);
			drop(output);
			input = next_input;
		}
		Ok(())
	}

	fn wait_all(&mut self, job: &mut Job) -> Result<(), ExecError> {
		while !job.is_done() {
			let (pid, exit) = self.spawner.wait_any()?;
			match job.record(pid, exit) {
				Some(i) => debug!("stage {}: pid {} finished with {:?}", i, pid, exit),
				None => warn!("reaped pid {} outside the pipeline", pid),
			}
		}
		Ok(())
	}

	fn abort(&mut self, job: &mut Job) {
		let pids: Vec<_> = job.running().collect();
		for pid in pids {
			self.spawner.kill(pid);
		}
		if let Err(e) = self.wait_all(job) {
			warn!("could not reap aborted stages: {}", e);
		}
	}
}

fn prepare(pipeline: &Pipeline) -> Result<Vec<PreparedStage>, ExecError> {
	pipeline.stages.iter().enumerate().map(|(index, stage)| PreparedStage::new(index, stage)).collect()
}
