//! Drawing off the event loop.
//!
//! A dedicated thread owns the terminal from raw-mode setup to teardown and
//! draws whatever [`Snapshot`] it is handed. The hand-off channel holds a
//! single frame, so a slow terminal drops frames instead of stalling input.

use std::io::{self, Stdout};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};

use crossterm::{
    cursor::Show,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use super::snapshot::Snapshot;

type Screen = Terminal<CrosstermBackend<Stdout>>;

enum RenderCommand {
    Draw(Box<Snapshot>),
    Shutdown,
}

pub struct RenderThread {
    frames: SyncSender<RenderCommand>,
    worker: Option<JoinHandle<()>>,
}

impl RenderThread {
    pub fn spawn() -> io::Result<Self> {
        let (frames, rx) = mpsc::sync_channel(1);
        let worker = thread::Builder::new()
            .name("render".to_string())
            .spawn(move || draw_loop(rx))?;
        Ok(Self {
            frames,
            worker: Some(worker),
        })
    }

    /// Hand a frame to the render thread without blocking. Returns false
    /// when the previous frame is still being drawn; the caller should
    /// retry on its next tick.
    pub fn render(&self, snapshot: Snapshot) -> bool {
        match self.frames.try_send(RenderCommand::Draw(Box::new(snapshot))) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => {
                tracing::error!("Render thread is gone, dropping frame");
                true
            }
        }
    }

    /// Stop drawing, restore the terminal, and wait for the thread
    pub fn shutdown(mut self) {
        self.frames.send(RenderCommand::Shutdown).ok();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!("Render thread panicked");
        }
    }
}

fn draw_loop(rx: Receiver<RenderCommand>) {
    let mut screen = match open_screen() {
        Ok(screen) => screen,
        Err(e) => {
            tracing::error!("Terminal setup failed: {}", e);
            return;
        }
    };

    let mut drawn: u64 = 0;
    while let Ok(RenderCommand::Draw(snapshot)) = rx.recv() {
        match screen.draw(|f| crate::ui::render(f, &snapshot)) {
            Ok(_) => drawn += 1,
            Err(e) => tracing::error!("Draw failed: {}", e),
        }
    }

    close_screen(&mut screen);
    tracing::debug!("Render thread stopped after {} frames", drawn);
}

fn open_screen() -> io::Result<Screen> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        disable_raw_mode().ok();
        return Err(e);
    }
    Terminal::new(CrosstermBackend::new(stdout)).inspect_err(|_| {
        execute!(io::stdout(), LeaveAlternateScreen).ok();
        disable_raw_mode().ok();
    })
}

fn close_screen(screen: &mut Screen) {
    disable_raw_mode().ok();
    execute!(screen.backend_mut(), LeaveAlternateScreen, Show).ok();
}
