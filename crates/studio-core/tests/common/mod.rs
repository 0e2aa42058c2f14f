#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::rc::Rc;

use studio_core::builtins::register_all;
use studio_core::{
    CommandContext, CommandHandler, CommandRegistry, Dispatcher, HandlerKind, JobManager, Outcome,
    ProcessHandle, ProcessHost, Result, Role, RoleHierarchy, Session, UserDirectory,
};
use tempfile::TempDir;

/// User id every test session runs as
pub const TEST_USER: &str = "a1b2c3d4e5f6";

pub fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

#[derive(Default)]
struct HostState {
    next_pid: u32,
    missing: BTreeSet<String>,
    stubborn: BTreeSet<String>,
    exited: BTreeSet<u32>,
    spawned: Vec<Vec<String>>,
    foreground: Vec<Vec<String>>,
    terminated: Vec<u32>,
    exit_code: Option<i32>,
}

/// In-memory process host recording every spawn and termination
#[derive(Clone)]
pub struct FakeHost {
    state: Rc<RefCell<HostState>>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(HostState {
                next_pid: 1000,
                exit_code: Some(0),
                ..HostState::default()
            })),
        }
    }

    /// Spawning this program fails as if it were not on PATH
    pub fn missing(self, program: &str) -> Self {
        self.state.borrow_mut().missing.insert(program.to_string());
        self
    }

    /// Processes of this program refuse to terminate
    pub fn stubborn(self, program: &str) -> Self {
        self.state.borrow_mut().stubborn.insert(program.to_string());
        self
    }

    /// Exit code reported by foreground runs
    pub fn exit_code(self, code: Option<i32>) -> Self {
        self.state.borrow_mut().exit_code = code;
        self
    }

    /// Let a process exit on its own
    pub fn finish(&self, pid: u32) {
        self.state.borrow_mut().exited.insert(pid);
    }

    pub fn spawned(&self) -> Vec<Vec<String>> {
        self.state.borrow().spawned.clone()
    }

    pub fn foreground(&self) -> Vec<Vec<String>> {
        self.state.borrow().foreground.clone()
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.state.borrow().terminated.clone()
    }

    pub fn manager(&self) -> JobManager {
        JobManager::new(Box::new(self.clone()))
    }

    fn check(&self, program: &str) -> io::Result<()> {
        if self.state.borrow().missing.contains(program) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "No such file or directory"));
        }
        Ok(())
    }
}

impl ProcessHost for FakeHost {
    fn spawn(&self, program: &str, args: &[String], _cwd: &Path) -> io::Result<Box<dyn ProcessHandle>> {
        self.check(program)?;
        let mut state = self.state.borrow_mut();
        let pid = state.next_pid;
        state.next_pid += 1;
        let mut line = vec![program.to_string()];
        line.extend(args.iter().cloned());
        state.spawned.push(line);
        Ok(Box::new(FakeHandle {
            pid,
            stubborn: state.stubborn.contains(program),
            state: self.state.clone(),
        }))
    }

    fn run(&self, program: &str, args: &[String], _cwd: &Path) -> io::Result<Option<i32>> {
        self.check(program)?;
        let mut state = self.state.borrow_mut();
        let mut line = vec![program.to_string()];
        line.extend(args.iter().cloned());
        state.foreground.push(line);
        Ok(state.exit_code)
    }
}

struct FakeHandle {
    pid: u32,
    stubborn: bool,
    state: Rc<RefCell<HostState>>,
}

impl ProcessHandle for FakeHandle {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn terminate(&mut self) -> io::Result<()> {
        if self.stubborn {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "operation not permitted",
            ));
        }
        let mut state = self.state.borrow_mut();
        state.terminated.push(self.pid);
        state.exited.insert(self.pid);
        Ok(())
    }

    fn has_exited(&mut self) -> io::Result<bool> {
        Ok(self.state.borrow().exited.contains(&self.pid))
    }
}

/// Handler that counts invocations
#[derive(Clone)]
pub struct CountingHandler {
    pub calls: Rc<Cell<usize>>,
    pub kind: HandlerKind,
}

impl CountingHandler {
    pub fn new(kind: HandlerKind) -> Self {
        Self {
            calls: Rc::new(Cell::new(0)),
            kind,
        }
    }
}

impl CommandHandler for CountingHandler {
    fn kind(&self) -> HandlerKind {
        self.kind
    }

    fn execute(&self, _ctx: &mut CommandContext<'_>, args: &[String]) -> Result<Outcome> {
        self.calls.set(self.calls.get() + 1);
        Ok(Outcome::Lines(args.to_vec()))
    }
}

/// Handler that always panics
pub struct PanickingHandler;

impl CommandHandler for PanickingHandler {
    fn execute(&self, _ctx: &mut CommandContext<'_>, _args: &[String]) -> Result<Outcome> {
        panic!("render farm exploded")
    }
}

/// A shell under test with its fake host and temporary working directory
pub struct TestShell {
    pub dispatcher: Dispatcher,
    pub host: FakeHost,
    pub dir: TempDir,
}

impl TestShell {
    pub fn run(&mut self, line: &str) -> Result<Outcome> {
        self.dispatcher.dispatch(line)
    }

    /// Lines of a successful outcome
    ///
    /// # Panics
    ///
    /// Panics if the line fails or produces no lines.
    pub fn lines(&mut self, line: &str) -> Vec<String> {
        match self.run(line) {
            Ok(Outcome::Lines(lines)) => lines,
            other => panic!("expected lines from {:?}, got {:?}", line, other),
        }
    }
}

/// Shell with the built-in commands and an unrestricted hierarchy
pub fn shell(role: Role) -> TestShell {
    shell_with(role, RoleHierarchy::unrestricted(), |_| {})
}

/// Shell with built-ins, a custom hierarchy and extra registrations
pub fn shell_with<F>(role: Role, hierarchy: RoleHierarchy, extra: F) -> TestShell
where
    F: FnOnce(&mut CommandRegistry),
{
    let dir = TempDir::new().unwrap();
    let host = FakeHost::new();
    shell_on(role, hierarchy, host, dir, extra)
}

pub fn shell_on<F>(
    role: Role,
    hierarchy: RoleHierarchy,
    host: FakeHost,
    dir: TempDir,
    extra: F,
) -> TestShell
where
    F: FnOnce(&mut CommandRegistry),
{
    let mut registry = CommandRegistry::new();
    register_all(&mut registry).unwrap();
    extra(&mut registry);

    let session = Session::new(TEST_USER, role, dir.path().canonicalize().unwrap());
    let users = UserDirectory::in_memory([(TEST_USER, role)]);
    let dispatcher = Dispatcher::new(hierarchy, registry, session, host.manager(), users);

    TestShell {
        dispatcher,
        host,
        dir,
    }
}
