use emath::Vec2;

use super::{LayoutEngine, LayoutPhase};

/// A press that moves less than this (in world units) before release is a
/// click, not a drag.
const DRAG_THRESHOLD: f32 = 4.0;

/// What a completed pointer gesture turned out to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DragGesture {
    /// No node was captured when the pointer went up.
    None,
    /// The pointer never crossed the drag threshold.
    Click(String),
    /// The node was dragged and has just been unpinned.
    Released(String),
}

pub(super) struct PointerCapture {
    node: usize,
    pointer_origin: Vec2,
    node_origin: Vec2,
    dragging: bool,
}

impl LayoutEngine {
    /// Captures a node under a pointer press. Nothing is pinned yet; a press
    /// only becomes a drag once the pointer crosses the threshold.
    pub fn pointer_down(&mut self, node_id: &str, pos: Vec2) {
        let Some(node) = self.node_index(node_id) else {
            return;
        };

        self.capture = Some(PointerCapture {
            node,
            pointer_origin: pos,
            node_origin: self.nodes[node].pos,
            dragging: false,
        });
    }

    /// Tracks pointer movement while a node is captured. Once the drag
    /// threshold is crossed the node is pinned and follows the pointer at the
    /// grab offset until release.
    pub fn pointer_move(&mut self, pos: Vec2) {
        let Some(capture) = self.capture.as_mut() else {
            return;
        };

        if !capture.dragging {
            if (pos - capture.pointer_origin).length() < DRAG_THRESHOLD {
                return;
            }
            capture.dragging = true;
            self.nodes[capture.node].pinned = true;
        }

        let node = &mut self.nodes[capture.node];
        node.pos = capture.node_origin + (pos - capture.pointer_origin);
        node.velocity = Vec2::ZERO;
        self.phase = LayoutPhase::Running;
    }

    /// Ends the capture and reports what the gesture was. A drag release
    /// unpins the node and wakes the simulation so neighbors re-settle around
    /// its new position; a plain click leaves the layout untouched.
    pub fn pointer_up(&mut self) -> DragGesture {
        let Some(capture) = self.capture.take() else {
            return DragGesture::None;
        };

        let id = self.nodes[capture.node].id.clone();
        if capture.dragging {
            self.nodes[capture.node].pinned = false;
            self.phase = LayoutPhase::Running;
            DragGesture::Released(id)
        } else {
            DragGesture::Click(id)
        }
    }
}
