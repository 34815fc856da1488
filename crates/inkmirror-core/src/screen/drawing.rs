//! Drawing screen: captures strokes and publishes them on request.

use crate::capture::StrokeStore;
use crate::client::{SyncClient, SyncResult};
use crate::input::{PointerEvent, PointerId};
use crate::notice::Notice;
use crate::preview::ViewBox;
use crate::remote::BoxFuture;
use crate::stroke::Drawing;
use std::collections::VecDeque;
use std::future::{poll_fn, Future};
use std::task::{Context, Poll, Waker};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawState {
    Idle,
    Stroking,
}

enum OpKind {
    /// Carries the drawing that was sent; it becomes the preview on success.
    Send(Drawing),
    Clear,
}

struct InFlight {
    kind: OpKind,
    future: BoxFuture<SyncResult<()>>,
}

/// State of the drawing screen.
pub struct DrawingScreen {
    client: SyncClient,
    strokes: StrokeStore,
    active_pointer: Option<PointerId>,
    preview: Drawing,
    preview_expanded: bool,
    in_flight: Vec<InFlight>,
    notices: VecDeque<Notice>,
}

impl DrawingScreen {
    pub fn new(client: SyncClient) -> Self {
        Self {
            client,
            strokes: StrokeStore::new(),
            active_pointer: None,
            preview: Drawing::new(),
            preview_expanded: false,
            in_flight: Vec::new(),
            notices: VecDeque::new(),
        }
    }

    pub fn state(&self) -> DrawState {
        if self.strokes.is_stroking() {
            DrawState::Stroking
        } else {
            DrawState::Idle
        }
    }

    /// Completed local strokes.
    pub fn drawing(&self) -> &Drawing {
        self.strokes.drawing()
    }

    /// Description of the stroke being drawn, if any.
    pub fn current_stroke(&self) -> Option<&str> {
        self.strokes.current().map(|buffer| buffer.as_str())
    }

    pub fn client(&self) -> &SyncClient {
        &self.client
    }

    pub fn touch_start(&mut self, x: f64, y: f64) {
        self.strokes.start(x, y);
    }

    pub fn touch_move(&mut self, x: f64, y: f64) {
        self.strokes.extend(x, y);
    }

    pub fn touch_end(&mut self) {
        self.strokes.end();
    }

    /// Drop the in-progress stroke without recording it.
    pub fn touch_cancel(&mut self) {
        self.strokes.discard();
    }

    /// Feed a pointer event. Only the pointer that started the stroke can
    /// extend or finish it. Release adds no point; a cancelled gesture
    /// leaves nothing behind. New strokes are ignored while the preview
    /// panel is expanded. Returns true when the canvas changed.
    pub fn handle_pointer(&mut self, event: PointerEvent) -> bool {
        let id = event.id();
        match event {
            PointerEvent::Down { position, .. } => {
                if self.preview_expanded || self.active_pointer.is_some() {
                    return false;
                }
                self.active_pointer = Some(id);
                self.touch_start(position.x, position.y);
                true
            }
            PointerEvent::Move { position, .. } if self.active_pointer == Some(id) => {
                self.touch_move(position.x, position.y);
                true
            }
            PointerEvent::Up { .. } if self.active_pointer == Some(id) => {
                self.active_pointer = None;
                self.touch_end();
                true
            }
            PointerEvent::Cancel { .. } if self.active_pointer == Some(id) => {
                self.active_pointer = None;
                self.touch_cancel();
                true
            }
            _ => false,
        }
    }

    /// Remove the last completed stroke. Local only.
    pub fn undo(&mut self) -> bool {
        self.strokes.undo().is_some()
    }

    /// Start publishing the completed strokes.
    ///
    /// With no completed strokes this raises a single "nothing to send"
    /// notice, makes no remote call and returns false.
    pub fn begin_send(&mut self) -> bool {
        if self.strokes.drawing().is_empty() {
            self.notices.push_back(Notice::nothing_to_send());
            return false;
        }
        let drawing = self.strokes.drawing().clone();
        let future = self.client.publish(&drawing);
        self.in_flight.push(InFlight { kind: OpKind::Send(drawing), future });
        true
    }

    /// Empty the local strokes and start clearing the shared drawing. The
    /// preview keeps showing what was last sent.
    pub fn begin_clear(&mut self) {
        self.strokes.clear();
        let future = self.client.clear();
        self.in_flight.push(InFlight { kind: OpKind::Clear, future });
    }

    pub fn is_busy(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Drive in-flight operations. Ready once none remain.
    pub fn poll(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        let mut index = 0;
        while index < self.in_flight.len() {
            match self.in_flight[index].future.as_mut().poll(cx) {
                Poll::Ready(outcome) => {
                    let op = self.in_flight.remove(index);
                    self.finish(op.kind, outcome);
                }
                Poll::Pending => index += 1,
            }
        }
        if self.in_flight.is_empty() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }

    /// Poll once without a waker; for frame loops that poll every frame.
    pub fn poll_pending(&mut self) -> bool {
        let mut cx = Context::from_waker(Waker::noop());
        self.poll(&mut cx).is_ready()
    }

    /// Send and wait for every in-flight operation to finish.
    pub async fn send(&mut self) {
        self.begin_send();
        poll_fn(|cx| self.poll(cx)).await;
    }

    /// Clear and wait for every in-flight operation to finish.
    pub async fn clear(&mut self) {
        self.begin_clear();
        poll_fn(|cx| self.poll(cx)).await;
    }

    fn finish(&mut self, kind: OpKind, outcome: SyncResult<()>) {
        let notice = match (kind, outcome) {
            (OpKind::Send(drawing), Ok(())) => {
                log::info!("Sent {} strokes", drawing.len());
                self.preview = drawing;
                Notice::sent()
            }
            (OpKind::Send(_), Err(e)) => Notice::send_failed(&e),
            (OpKind::Clear, Ok(())) => Notice::cleared(),
            (OpKind::Clear, Err(e)) => Notice::clear_failed(&e),
        };
        self.notices.push_back(notice);
    }

    /// Oldest undismissed notice.
    pub fn notice(&self) -> Option<&Notice> {
        self.notices.front()
    }

    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// The drawing most recently sent successfully.
    pub fn preview_source(&self) -> &Drawing {
        &self.preview
    }

    pub fn preview_box(&self) -> ViewBox {
        ViewBox::of(&self.preview)
    }

    pub fn is_preview_expanded(&self) -> bool {
        self.preview_expanded
    }

    pub fn toggle_preview(&mut self) {
        self.preview_expanded = !self.preview_expanded;
    }
}
