use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::types::Type;

/// Opaque handle naming one lexical frame.
///
/// Handles are plain integers so they can be compared, hashed and stored in
/// capture sets by value. A derived table numbers its frames after its
/// parent's, so handles never collide along one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(u32);

impl FrameId {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Root,
    Block,
    /// A host-defined scope such as `game`.
    Named(Arc<str>),
}

impl ScopeKind {
    pub fn named(name: &str) -> Self {
        ScopeKind::Named(Arc::from(name))
    }

    fn matches(&self, name: &str) -> bool {
        match self {
            ScopeKind::Root => name == "root",
            ScopeKind::Block => name == "block",
            ScopeKind::Named(kind) => &**kind == name,
        }
    }
}

/// A value known at analysis time.
#[derive(Debug, Clone, PartialEq)]
pub enum StaticValue {
    Unit,
    Bool(bool),
    Int(i64),
    Real(f64),
    String(Arc<str>),
    Type(Type),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// Resolved at run time through a frame slot.
    Slot { ty: Type, slot: u32 },
    /// Resolved at analysis time; consumes no slot.
    Static { ty: Type, value: StaticValue },
}

impl Entry {
    pub fn ty(&self) -> &Type {
        match self {
            Entry::Slot { ty, .. } | Entry::Static { ty, .. } => ty,
        }
    }
}

/// Result of a successful name lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub frame: FrameId,
    pub entry: Entry,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("unresolved identifier `{name}`")]
    UnresolvedIdentifier { name: String },
    #[error("cannot pop the root scope")]
    PopRoot,
    #[error("no enclosing `{scope}` scope")]
    UnknownScope { scope: String },
    #[error("frame {frame} is not owned by this symbol table")]
    ForeignFrame { frame: FrameId },
}

#[derive(Debug, Clone)]
struct Frame {
    kind: ScopeKind,
    parent: Option<FrameId>,
    next_slot: u32,
    entries: HashMap<String, Entry>,
    captures: BTreeSet<FrameId>,
}

impl Frame {
    fn new(kind: ScopeKind, parent: Option<FrameId>) -> Self {
        Frame {
            kind,
            parent,
            next_slot: 0,
            entries: HashMap::new(),
            captures: BTreeSet::new(),
        }
    }
}

/// Lexical scope chain used during analysis.
///
/// Frames are arena-allocated and addressed by [`FrameId`]. A table may be
/// derived from a shared parent (e.g. the process-wide prelude): lookups fall
/// through to the parent, but every mutation stays local.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    parent: Option<Arc<SymbolTable>>,
    base: u32,
    frames: Vec<Frame>,
    current: FrameId,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// A fresh table holding only a root frame.
    pub fn new() -> Self {
        SymbolTable {
            parent: None,
            base: 0,
            frames: vec![Frame::new(ScopeKind::Root, None)],
            current: FrameId(0),
        }
    }

    /// Derive a child table whose first frame (of `kind`) sits below the
    /// parent's current frame.
    pub fn derive(parent: Arc<SymbolTable>, kind: ScopeKind) -> Self {
        let base = parent.frame_count();
        let anchor = parent.current;
        SymbolTable {
            parent: Some(parent),
            base,
            frames: vec![Frame::new(kind, Some(anchor))],
            current: FrameId(base),
        }
    }

    /// Number of frames visible through this table, including the parent's.
    pub fn frame_count(&self) -> u32 {
        self.base + self.frames.len() as u32
    }

    pub fn current(&self) -> FrameId {
        self.current
    }

    pub fn kind(&self, frame: FrameId) -> Option<&ScopeKind> {
        self.frame(frame).map(|f| &f.kind)
    }

    fn frame(&self, id: FrameId) -> Option<&Frame> {
        if id.0 < self.base {
            self.parent.as_ref().and_then(|p| p.frame(id))
        } else {
            self.frames.get((id.0 - self.base) as usize)
        }
    }

    fn local_mut(&mut self, id: FrameId) -> Option<&mut Frame> {
        if id.0 < self.base {
            None
        } else {
            self.frames.get_mut((id.0 - self.base) as usize)
        }
    }

    fn current_mut(&mut self) -> &mut Frame {
        let index = (self.current.0 - self.base) as usize;
        &mut self.frames[index]
    }

    /// Enter a new frame nested in the current one.
    pub fn push(&mut self, kind: ScopeKind) -> FrameId {
        let id = FrameId(self.frame_count());
        self.frames.push(Frame::new(kind, Some(self.current)));
        self.current = id;
        id
    }

    /// Leave the current frame. The first frame of a table cannot be popped.
    pub fn pop(&mut self) -> Result<FrameId, ResolutionError> {
        let popped = self.current;
        match self.frame(popped).and_then(|f| f.parent) {
            Some(parent) if parent.0 >= self.base => {
                self.current = parent;
                Ok(popped)
            }
            _ => Err(ResolutionError::PopRoot),
        }
    }

    /// Create a dynamic binding in the current frame.
    pub fn allocate_slot(&mut self, name: &str, ty: Type) -> u32 {
        let frame = self.current_mut();
        let slot = frame.next_slot;
        frame.next_slot += 1;
        frame.entries.insert(name.to_string(), Entry::Slot { ty, slot });
        tracing::trace!(name, slot, frame = %self.current, "allocated slot");
        slot
    }

    /// Create a dynamic binding in a specific local frame.
    pub fn allocate_slot_in(
        &mut self,
        frame_id: FrameId,
        name: &str,
        ty: Type,
    ) -> Result<u32, ResolutionError> {
        let frame = self
            .local_mut(frame_id)
            .ok_or(ResolutionError::ForeignFrame { frame: frame_id })?;
        let slot = frame.next_slot;
        frame.next_slot += 1;
        frame.entries.insert(name.to_string(), Entry::Slot { ty, slot });
        tracing::trace!(name, slot, frame = %frame_id, "allocated slot");
        Ok(slot)
    }

    /// Create a compile-time constant binding in the current frame.
    pub fn set_static(&mut self, name: &str, ty: Type, value: StaticValue) {
        self.current_mut()
            .entries
            .insert(name.to_string(), Entry::Static { ty, value });
    }

    /// Number of slots allocated so far in `frame`.
    pub fn slot_count(&self, frame: FrameId) -> u32 {
        self.frame(frame).map(|f| f.next_slot).unwrap_or(0)
    }

    pub fn has(&self, name: &str) -> bool {
        let mut cursor = Some(self.current);
        while let Some(id) = cursor {
            let Some(frame) = self.frame(id) else { break };
            if frame.entries.contains_key(name) {
                return true;
            }
            cursor = frame.parent;
        }
        false
    }

    /// Look `name` up along the scope chain.
    ///
    /// When the binding is a slot in an ancestor frame, every frame walked
    /// through on the way records that ancestor as a capture.
    pub fn at(&mut self, name: &str) -> Result<Lookup, ResolutionError> {
        let mut path = Vec::new();
        let mut cursor = Some(self.current);
        while let Some(id) = cursor {
            let Some(frame) = self.frame(id) else { break };
            if let Some(entry) = frame.entries.get(name) {
                let entry = entry.clone();
                if matches!(entry, Entry::Slot { .. }) {
                    self.record_capture(&path, id);
                }
                return Ok(Lookup { frame: id, entry });
            }
            path.push(id);
            cursor = frame.parent;
        }
        Err(ResolutionError::UnresolvedIdentifier {
            name: name.to_string(),
        })
    }

    /// Record `target` as a capture of every frame between the current one
    /// and `target`, for writes into an ancestor such as a named-scope let.
    ///
    /// Does nothing when `target` is the current frame or not an ancestor.
    pub fn capture(&mut self, target: FrameId) {
        let mut path = Vec::new();
        let mut cursor = Some(self.current);
        while let Some(id) = cursor {
            if id == target {
                self.record_capture(&path, target);
                return;
            }
            let Some(frame) = self.frame(id) else { break };
            path.push(id);
            cursor = frame.parent;
        }
    }

    fn record_capture(&mut self, path: &[FrameId], target: FrameId) {
        for &intermediate in path {
            if let Some(frame) = self.local_mut(intermediate) {
                frame.captures.insert(target);
            }
        }
    }

    /// Frames captured by `frame`, in ascending order.
    pub fn captures(&self, frame: FrameId) -> Vec<FrameId> {
        self.frame(frame)
            .map(|f| f.captures.iter().copied().collect())
            .unwrap_or_default()
    }

    /// The nearest frame, starting at the current one, whose kind is `scope`.
    pub fn enclosing(&self, scope: &str) -> Result<FrameId, ResolutionError> {
        let mut cursor = Some(self.current);
        while let Some(id) = cursor {
            let Some(frame) = self.frame(id) else { break };
            if frame.kind.matches(scope) {
                return Ok(id);
            }
            cursor = frame.parent;
        }
        Err(ResolutionError::UnknownScope {
            scope: scope.to_string(),
        })
    }
}
