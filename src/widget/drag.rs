//! Header drag positioning
//!
//! `Idle → Dragging → Idle`. Document-level pointer listeners are held by a
//! [`ListenerGuard`] for exactly as long as a drag is active; dropping the
//! guard detaches them, whichever way the drag ends.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Pointer coordinates in client pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Widget offset in document pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidgetPosition {
    pub top: f64,
    pub left: f64,
}

impl WidgetPosition {
    pub fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ListenerKind {
    PointerMove,
    PointerUp,
    PointerLeave,
}

#[derive(Debug, Default)]
struct ListenerTable {
    next_id: u64,
    active: BTreeMap<u64, ListenerKind>,
}

/// Listener registry for the host document.
///
/// Clones share the same table, so the shell can ask whether document events
/// should be routed while the drag controller owns the subscription.
#[derive(Debug, Clone, Default)]
pub struct DocumentListeners {
    table: Rc<RefCell<ListenerTable>>,
}

impl DocumentListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach listeners; they stay attached until the returned guard drops.
    #[must_use = "listeners detach as soon as the guard is dropped"]
    pub fn attach(&self, kinds: &[ListenerKind]) -> ListenerGuard {
        let mut table = self.table.borrow_mut();
        let ids = kinds
            .iter()
            .map(|&kind| {
                let id = table.next_id;
                table.next_id += 1;
                table.active.insert(id, kind);
                id
            })
            .collect();

        ListenerGuard {
            table: Rc::clone(&self.table),
            ids,
        }
    }

    pub fn is_attached(&self, kind: ListenerKind) -> bool {
        self.table.borrow().active.values().any(|&k| k == kind)
    }

    pub fn active_count(&self) -> usize {
        self.table.borrow().active.len()
    }
}

/// Scoped listener subscription
#[derive(Debug)]
pub struct ListenerGuard {
    table: Rc<RefCell<ListenerTable>>,
    ids: Vec<u64>,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        let mut table = self.table.borrow_mut();
        for id in &self.ids {
            table.active.remove(id);
        }
    }
}

#[derive(Debug)]
enum DragState {
    Idle,
    Dragging {
        last: PointerPosition,
        _listeners: ListenerGuard,
    },
}

/// Moves the widget by tracking relative pointer deltas.
///
/// No clamping: the widget may be dragged partly or fully off-screen.
#[derive(Debug)]
pub struct DragController {
    position: WidgetPosition,
    document: DocumentListeners,
    state: DragState,
}

const DRAG_LISTENERS: [ListenerKind; 3] = [
    ListenerKind::PointerMove,
    ListenerKind::PointerUp,
    ListenerKind::PointerLeave,
];

impl DragController {
    pub fn new(position: WidgetPosition, document: DocumentListeners) -> Self {
        Self {
            position,
            document,
            state: DragState::Idle,
        }
    }

    pub fn position(&self) -> WidgetPosition {
        self.position
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Pointer pressed on the header
    pub fn pointer_down(&mut self, at: PointerPosition) {
        // Release any previous subscription before taking a new one.
        self.state = DragState::Idle;
        self.state = DragState::Dragging {
            last: at,
            _listeners: self.document.attach(&DRAG_LISTENERS),
        };
        tracing::debug!(x = at.x, y = at.y, "Drag started");
    }

    /// Pointer moved anywhere in the document. Returns whether the widget moved.
    pub fn pointer_move(&mut self, at: PointerPosition) -> bool {
        let DragState::Dragging { last, .. } = &mut self.state else {
            return false;
        };

        let dx = last.x - at.x;
        let dy = last.y - at.y;
        *last = at;

        self.position.left -= dx;
        self.position.top -= dy;
        true
    }

    /// Pointer released anywhere in the document
    pub fn pointer_up(&mut self) {
        self.finish("pointer up");
    }

    /// Pointer left the window mid-drag
    pub fn pointer_leave(&mut self) {
        self.finish("pointer left window");
    }

    fn finish(&mut self, reason: &str) {
        if self.is_dragging() {
            self.state = DragState::Idle;
            tracing::debug!(
                reason,
                top = self.position.top,
                left = self.position.left,
                "Drag ended"
            );
        }
    }
}
