use nix::sys::signal::Signal;
use nix::sys::wait::WaitStatus;
use nix::unistd::Pid;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum StageExit {
	Exited(i32),
	Signaled(Signal),
}

impl StageExit {
	// 128 + signal number for signal deaths, as shells report it.
	pub fn code(self) -> i32 {
		match self {
			StageExit::Exited(code) => code,
			StageExit::Signaled(sig) => 128 + sig as i32,
		}
	}

	pub fn success(self) -> bool {
		self == StageExit::Exited(0)
	}
}

pub trait WaitStatusExt {
	// `None` for stop/continue notifications.
	fn exit(self) -> Option<StageExit>;
}

impl WaitStatusExt for WaitStatus {
	fn exit(self) -> Option<StageExit> {
		match self {
			WaitStatus::Exited(_, code) => Some(StageExit::Exited(code)),
			WaitStatus::Signaled(_, sig, _) => Some(StageExit::Signaled(sig)),
			_ => None,
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Process {
	pub pid: Pid,
	pub exit: Option<StageExit>,
}

#[derive(Debug, Default)]
pub struct Job {
	processes: Vec<Process>,
}

impl Job {
	pub fn with_capacity(stages: usize) -> Job {
		Job { processes: Vec::with_capacity(stages) }
	}

	pub fn push(&mut self, pid: Pid) {
		self.processes.push(Process { pid: pid, exit: None });
	}

	pub fn record(&mut self, pid: Pid, exit: StageExit) -> Option<usize> {
		let (i, pr) = self.processes.iter_mut().enumerate().find(|(_, pr)| pr.pid == pid)?;
		pr.exit = Some(exit);
		Some(i)
	}

	pub fn running(&self) -> impl Iterator<Item = Pid> + '_ {
		self.processes.iter().filter(|pr| pr.exit.is_none()).map(|pr| pr.pid)
	}

	pub fn is_done(&self) -> bool {
		self.running().next().is_none()
	}

	pub fn processes(&self) -> &[Process] {
		&self.processes
	}

	pub fn len(&self) -> usize {
		self.processes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.processes.is_empty()
	}

	pub fn last_exit(&self) -> Option<StageExit> {
		self.processes.last().and_then(|pr| pr.exit)
	}
}
