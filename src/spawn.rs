use crate::eval::ExecError;
use crate::job::{StageExit, WaitStatusExt};
use crate::types::Stage;

use std::ffi::{self, CStr, CString};
use std::io;
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};
use nix::errno::Errno;
use nix::sys::signal::{self, SigHandler, Signal};
use nix::sys::wait;
use nix::unistd::{self, ForkResult, Pid};

pub const EXIT_NOT_FOUND: i32 = 127;
pub const EXIT_CANNOT_EXEC: i32 = 126;

// Converted in the parent so the child has nothing left to allocate.
#[derive(Debug)]
pub struct PreparedStage {
	program: CString,
	argv: Vec<CString>,
}

impl PreparedStage {
	pub(crate) fn new(index: usize, stage: &Stage) -> Result<PreparedStage, ExecError> {
		let argv: Result<Vec<CString>, ffi::NulError> = stage.args().iter().map(|s| CString::new(s.clone())).collect();
		let argv = argv?;
		let program = match argv.first() {
			Some(program) => program.clone(),
			None => { return Err(ExecError::EmptyStage { index: index }); },
		};
		Ok(PreparedStage { program: program, argv: argv })
	}

	pub fn program(&self) -> &CStr {
		&self.program
	}

	pub fn argv(&self) -> &[CString] {
		&self.argv
	}
}

// `None` inherits the parent's stream. `unused` is the read end of the
// child's own output pipe.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageIo<'a> {
	pub stdin: Option<BorrowedFd<'a>>,
	pub stdout: Option<BorrowedFd<'a>>,
	pub unused: Option<BorrowedFd<'a>>,
}

pub trait Spawner {
	fn spawn(&mut self, stage: &PreparedStage, io: StageIo) -> Result<Pid, ExecError>;

	fn wait_any(&mut self) -> Result<(Pid, StageExit), ExecError>;

	fn kill(&mut self, pid: Pid);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ForkExec;

impl Spawner for ForkExec {
	fn spawn(&mut self, stage: &PreparedStage, io: StageIo) -> Result<Pid, ExecError> {
		match unsafe { unistd::fork() }? {
			ForkResult::Parent { child } => Ok(child),
			ForkResult::Child => exec_stage(stage, io),
		}
	}

	fn wait_any(&mut self) -> Result<(Pid, StageExit), ExecError> {
		loop {
			let status = match wait::wait() {
				Err(Errno::EINTR) => { continue; },
				r => r?,
			};
			if let (Some(pid), Some(exit)) = (status.pid(), status.exit()) {
				return Ok((pid, exit));
			}
		}
	}

	fn kill(&mut self, pid: Pid) {
		let _ = signal::kill(pid, Signal::SIGKILL);
	}
}

// Runs in the forked child: no allocation, no logging, never returns.
fn exec_stage(stage: &PreparedStage, io: StageIo) -> ! {
	if let Some(fd) = io.stdin {
		redirect(fd.as_raw_fd(), libc::STDIN_FILENO);
	}
	if let Some(fd) = io.unused {
		let _ = unistd::close(fd.as_raw_fd());
	}
	if let Some(fd) = io.stdout {
		redirect(fd.as_raw_fd(), libc::STDOUT_FILENO);
	}

	// The Rust runtime ignores SIGPIPE and the disposition survives exec.
	let _ = unsafe { signal::signal(Signal::SIGPIPE, SigHandler::SigDfl) };

	let e = match unistd::execvp(&stage.program, &stage.argv) {
		Err(e) => e,
		Ok(never) => match never {},
	};
	report(stage.program.to_bytes(), e);
	let status = if e == Errno::ENOENT { EXIT_NOT_FOUND } else { EXIT_CANNOT_EXEC };
	unsafe { libc::_exit(status) }
}

fn redirect(fd: RawFd, target: RawFd) {
	if fd == target {
		return;
	}
	if let Err(e) = unistd::dup2(fd, target) {
		report(b"dup2", e);
		unsafe { libc::_exit(EXIT_CANNOT_EXEC) }
	}
	let _ = unistd::close(fd);
}

fn report(what: &[u8], e: Errno) {
	let stderr = io::stderr();
	let parts: [&[u8]; 5] = [b"pipex: ", what, b": ", e.desc().as_bytes(), b"\n"];
	for part in parts {
		let _ = unistd::write(&stderr, part);
	}
}
