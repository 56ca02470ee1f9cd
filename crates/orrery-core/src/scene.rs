//! Scene graph of named draw nodes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use orrery_render::{FrameState, Gpu};

use crate::celestial::Drawable;

/// Stable handle to an attached scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

struct SceneNode {
    id: NodeId,
    name: String,
    drawable: Rc<RefCell<dyn Drawable>>,
}

/// A flat scene graph: every attached node is drawn once per frame in
/// attachment order. Nodes hold non-owning draw pointers; the object that
/// attached a node detaches it again before dropping the drawable.
pub struct SceneGraph {
    nodes: RefCell<Vec<SceneNode>>,
    next_id: Cell<u64>,
}

impl SceneGraph {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            nodes: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        })
    }

    /// Attach a drawable under `name` and return its node handle.
    pub fn attach(&self, name: &str, drawable: Rc<RefCell<dyn Drawable>>) -> NodeId {
        let id = NodeId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.nodes.borrow_mut().push(SceneNode {
            id,
            name: name.to_string(),
            drawable,
        });
        id
    }

    /// Detach a node. Returns whether it was present.
    pub fn detach(&self, id: NodeId) -> bool {
        let mut nodes = self.nodes.borrow_mut();
        let before = nodes.len();
        nodes.retain(|node| node.id != id);
        nodes.len() != before
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.nodes.borrow().iter().any(|node| node.id == id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    /// Draw every node. A node that produces no output is tolerated.
    pub fn draw_all(&self, gpu: &Gpu, frame: &FrameState, pass: &mut wgpu::RenderPass<'_>) {
        for node in self.nodes.borrow().iter() {
            if !node.drawable.borrow_mut().draw(gpu, frame, pass) {
                tracing::trace!("scene node \"{}\" produced no output", node.name);
            }
        }
    }
}
