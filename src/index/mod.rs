//! The piece index: a red-black tree of pieces, augmented with per-subtree
//! character and newline counts so that document offsets never need to be
//! stored on a node.
//!
//! Nodes live in an arena (`Vec<Node>`) addressed by `u32` id; deleted slots
//! are pushed onto a free list and reused by the next insertion. This keeps
//! the tree free of real pointers (and therefore free of parent/child
//! reference cycles) the way an index-based tree representation does.
//!
//! Rotations restructure at most two or three nodes and never change the
//! total content of the subtree rooted where the rotation happens, so after
//! the initial bottom-up aggregate refresh that follows an attach or splice,
//! every rotation performed during fixup only has to recompute the node(s)
//! it directly touches — ancestors above stay correct automatically.

use crate::error::{EngineError, Result};
use crate::piece::Piece;

pub type NodeId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Clone, Debug)]
struct Node {
    piece: Piece,
    color: Color,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    sub_len: usize,
    sub_newlines: usize,
}

/// Red-black ordered tree of pieces, ordered by in-order position (not by
/// `Piece::start`, which is buffer-local and not a document key).
#[derive(Default)]
pub struct PieceIndex {
    arena: Vec<Node>,
    free: Vec<NodeId>,
    root: Option<NodeId>,
}

impl PieceIndex {
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            free: Vec::new(),
            root: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn total_len(&self) -> usize {
        self.len_of(self.root)
    }

    pub fn total_newlines(&self) -> usize {
        self.newlines_of(self.root)
    }

    pub fn piece(&self, id: NodeId) -> &Piece {
        &self.node(id).piece
    }

    pub fn piece_mut(&mut self, id: NodeId) -> &mut Piece {
        &mut self.arena[id as usize].piece
    }

    /// Mutate a piece's length/newline count through `f`, then repair every
    /// ancestor's cached aggregates along the path to the root. Use this
    /// (rather than `piece_mut`) whenever the edit changes `length` or
    /// `newlines`; a plain `start` adjustment needs no recompute.
    pub fn update_piece<F: FnOnce(&mut Piece)>(&mut self, id: NodeId, f: F) {
        f(&mut self.arena[id as usize].piece);
        self.recompute_path_to_root(Some(id));
    }

    // -- small accessors treating a missing node as a black, zero-sized nil --

    fn node(&self, id: NodeId) -> &Node {
        &self.arena[id as usize]
    }

    fn color(&self, id: Option<NodeId>) -> Color {
        id.map_or(Color::Black, |i| self.node(i).color)
    }

    fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left
    }

    fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    fn len_of(&self, id: Option<NodeId>) -> usize {
        id.map_or(0, |i| self.node(i).sub_len)
    }

    fn newlines_of(&self, id: Option<NodeId>) -> usize {
        id.map_or(0, |i| self.node(i).sub_newlines)
    }

    fn set_color(&mut self, id: NodeId, color: Color) {
        self.arena[id as usize].color = color;
    }

    fn set_left(&mut self, id: NodeId, child: Option<NodeId>) {
        self.arena[id as usize].left = child;
    }

    fn set_right(&mut self, id: NodeId, child: Option<NodeId>) {
        self.arena[id as usize].right = child;
    }

    fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        self.arena[id as usize].parent = parent;
    }

    fn set_parent_opt(&mut self, id: Option<NodeId>, parent: Option<NodeId>) {
        if let Some(i) = id {
            self.set_parent(i, parent);
        }
    }

    fn recompute(&mut self, id: NodeId) {
        let left = self.node(id).left;
        let right = self.node(id).right;
        let piece_len = self.node(id).piece.length;
        let piece_nl = self.node(id).piece.newlines;
        let sub_len = self.len_of(left) + piece_len + self.len_of(right);
        let sub_newlines = self.newlines_of(left) + piece_nl + self.newlines_of(right);
        let n = &mut self.arena[id as usize];
        n.sub_len = sub_len;
        n.sub_newlines = sub_newlines;
    }

    fn recompute_path_to_root(&mut self, mut id: Option<NodeId>) {
        while let Some(i) = id {
            self.recompute(i);
            id = self.parent(i);
        }
    }

    fn alloc(&mut self, piece: Piece) -> NodeId {
        let node = Node {
            sub_len: piece.length,
            sub_newlines: piece.newlines,
            piece,
            color: Color::Red,
            parent: None,
            left: None,
            right: None,
        };
        if let Some(id) = self.free.pop() {
            self.arena[id as usize] = node;
            id
        } else {
            let id = self.arena.len() as NodeId;
            self.arena.push(node);
            id
        }
    }

    fn free(&mut self, id: NodeId) {
        self.free.push(id);
    }

    // -- rotations --

    fn rotate_left(&mut self, x: NodeId) {
        let y = self.right(x).expect("rotate_left requires a right child");
        let y_left = self.left(y);
        self.set_right(x, y_left);
        self.set_parent_opt(y_left, Some(x));

        let x_parent = self.parent(x);
        self.set_parent(y, x_parent);
        match x_parent {
            None => self.root = Some(y),
            Some(p) => {
                if self.left(p) == Some(x) {
                    self.set_left(p, Some(y));
                } else {
                    self.set_right(p, Some(y));
                }
            }
        }

        self.set_left(y, Some(x));
        self.set_parent(x, Some(y));

        self.recompute(x);
        self.recompute(y);
    }

    fn rotate_right(&mut self, x: NodeId) {
        let y = self.left(x).expect("rotate_right requires a left child");
        let y_right = self.right(y);
        self.set_left(x, y_right);
        self.set_parent_opt(y_right, Some(x));

        let x_parent = self.parent(x);
        self.set_parent(y, x_parent);
        match x_parent {
            None => self.root = Some(y),
            Some(p) => {
                if self.left(p) == Some(x) {
                    self.set_left(p, Some(y));
                } else {
                    self.set_right(p, Some(y));
                }
            }
        }

        self.set_right(y, Some(x));
        self.set_parent(x, Some(y));

        self.recompute(x);
        self.recompute(y);
    }

    // -- navigation --

    pub fn min_under(&self, mut id: NodeId) -> NodeId {
        while let Some(l) = self.left(id) {
            id = l;
        }
        id
    }

    pub fn max_under(&self, mut id: NodeId) -> NodeId {
        while let Some(r) = self.right(id) {
            id = r;
        }
        id
    }

    pub fn first(&self) -> Option<NodeId> {
        self.root.map(|r| self.min_under(r))
    }

    pub fn last(&self) -> Option<NodeId> {
        self.root.map(|r| self.max_under(r))
    }

    pub fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(r) = self.right(id) {
            return Some(self.min_under(r));
        }
        let mut x = id;
        let mut p = self.parent(x);
        while let Some(pp) = p {
            if self.left(pp) == Some(x) {
                return Some(pp);
            }
            x = pp;
            p = self.parent(x);
        }
        None
    }

    pub fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(l) = self.left(id) {
            return Some(self.max_under(l));
        }
        let mut x = id;
        let mut p = self.parent(x);
        while let Some(pp) = p {
            if self.right(pp) == Some(x) {
                return Some(pp);
            }
            x = pp;
            p = self.parent(x);
        }
        None
    }

    /// Document offset of the start of `id`'s piece.
    pub fn position_of(&self, id: NodeId) -> usize {
        let mut offset = self.len_of(self.left(id));
        let mut x = id;
        while let Some(p) = self.parent(x) {
            if self.right(p) == Some(x) {
                offset += self.len_of(self.left(p)) + self.node(p).piece.length;
            }
            x = p;
        }
        offset
    }

    /// Locate the piece containing `offset` and the in-piece remainder.
    /// `offset == total_len()` resolves to the last piece with a remainder
    /// equal to its length (an "at end" locator).
    pub fn locate(&self, offset: usize) -> Result<(NodeId, usize)> {
        let total = self.total_len();
        if offset > total {
            return Err(EngineError::out_of_range(format!(
                "offset {} exceeds document length {}",
                offset, total
            )));
        }
        let mut current = self
            .root
            .ok_or_else(|| EngineError::empty_document("piece index is empty"))?;
        let mut remaining = offset;
        loop {
            let left_len = self.len_of(self.left(current));
            let piece_len = self.node(current).piece.length;
            if remaining < left_len {
                current = self.left(current).expect("left_len > 0 implies a left child");
            } else if remaining < left_len + piece_len || self.right(current).is_none() {
                return Ok((current, (remaining - left_len).min(piece_len)));
            } else {
                remaining -= left_len + piece_len;
                current = self.right(current).unwrap();
            }
        }
    }

    /// In-order iteration of piece ids.
    pub fn ids_in_order(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_in_order(self.root, &mut out);
        out
    }

    fn collect_in_order(&self, id: Option<NodeId>, out: &mut Vec<NodeId>) {
        if let Some(i) = id {
            self.collect_in_order(self.left(i), out);
            out.push(i);
            self.collect_in_order(self.right(i), out);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Piece> {
        self.ids_in_order().into_iter().map(move |id| self.piece(id))
    }

    // -- structural insertion --

    fn attach(&mut self, parent: NodeId, new_id: NodeId, as_left: bool) {
        if as_left {
            self.set_left(parent, Some(new_id));
        } else {
            self.set_right(parent, Some(new_id));
        }
        self.set_parent(new_id, Some(parent));
        self.recompute_path_to_root(Some(parent));
        self.insert_fixup(new_id);
    }

    fn attach_root(&mut self, new_id: NodeId) {
        self.root = Some(new_id);
        self.set_color(new_id, Color::Black);
    }

    /// Insert `piece` as the very first piece in document order.
    pub fn insert_first(&mut self, piece: Piece) -> NodeId {
        let new_id = self.alloc(piece);
        match self.root {
            None => self.attach_root(new_id),
            Some(root) => {
                let leftmost = self.min_under(root);
                self.attach(leftmost, new_id, true);
            }
        }
        new_id
    }

    /// Insert `piece` as the very last piece in document order.
    pub fn push_back(&mut self, piece: Piece) -> NodeId {
        let new_id = self.alloc(piece);
        match self.root {
            None => self.attach_root(new_id),
            Some(root) => {
                let rightmost = self.max_under(root);
                self.attach(rightmost, new_id, false);
            }
        }
        new_id
    }

    /// Insert `piece` immediately after `id` in document order. Uses the
    /// standard successor-slot technique: if `id` has no right child, the
    /// new node becomes that right child; otherwise it becomes the left
    /// child of `id`'s in-order successor (which, having come from the
    /// right subtree, never has a left child yet).
    pub fn insert_after(&mut self, id: NodeId, piece: Piece) -> NodeId {
        let new_id = self.alloc(piece);
        match self.right(id) {
            None => self.attach(id, new_id, false),
            Some(r) => {
                let succ = self.min_under(r);
                self.attach(succ, new_id, true);
            }
        }
        new_id
    }

    /// Insert `piece` immediately before `id` in document order, symmetric
    /// to `insert_after`.
    pub fn insert_before(&mut self, id: NodeId, piece: Piece) -> NodeId {
        let new_id = self.alloc(piece);
        match self.left(id) {
            None => self.attach(id, new_id, true),
            Some(l) => {
                let pred = self.max_under(l);
                self.attach(pred, new_id, false);
            }
        }
        new_id
    }

    /// Split the piece at `id` at local offset `k` (`0 < k < length`) into
    /// two adjacent pieces. `left_newlines` is the newline count of
    /// `[start, start+k)`, supplied by the caller (the index has no access
    /// to buffer contents). Returns the id of the newly created right-hand
    /// piece; `id` itself is mutated in place to become the left-hand piece.
    pub fn split(&mut self, id: NodeId, k: usize, left_newlines: usize) -> Result<NodeId> {
        let original = self.node(id).piece;
        if k == 0 || k >= original.length {
            return Err(EngineError::internal(format!(
                "split offset {} out of range for piece of length {}",
                k, original.length
            )));
        }
        let right_piece = Piece::new(
            original.buffer_id,
            original.start + k,
            original.length - k,
            original.newlines - left_newlines,
        );
        {
            let left = &mut self.arena[id as usize].piece;
            left.length = k;
            left.newlines = left_newlines;
        }
        self.recompute_path_to_root(Some(id));
        Ok(self.insert_after(id, right_piece))
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        while self.color(self.parent(z)) == Color::Red {
            let p = self.parent(z).unwrap();
            let g = self.parent(p).unwrap();
            if Some(p) == self.left(g) {
                let uncle = self.right(g);
                if self.color(uncle) == Color::Red {
                    self.set_color(p, Color::Black);
                    self.set_color(uncle.unwrap(), Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if Some(z) == self.right(p) {
                        z = p;
                        self.rotate_left(z);
                    }
                    let p = self.parent(z).unwrap();
                    let g = self.parent(p).unwrap();
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_right(g);
                }
            } else {
                let uncle = self.left(g);
                if self.color(uncle) == Color::Red {
                    self.set_color(p, Color::Black);
                    self.set_color(uncle.unwrap(), Color::Black);
                    self.set_color(g, Color::Red);
                    z = g;
                } else {
                    if Some(z) == self.left(p) {
                        z = p;
                        self.rotate_right(z);
                    }
                    let p = self.parent(z).unwrap();
                    let g = self.parent(p).unwrap();
                    self.set_color(p, Color::Black);
                    self.set_color(g, Color::Red);
                    self.rotate_left(g);
                }
            }
        }
        self.set_color(self.root.unwrap(), Color::Black);
    }

    fn transplant(&mut self, u: NodeId, v: Option<NodeId>) {
        let p = self.parent(u);
        match p {
            None => self.root = v,
            Some(pp) => {
                if self.left(pp) == Some(u) {
                    self.set_left(pp, v);
                } else {
                    self.set_right(pp, v);
                }
            }
        }
        self.set_parent_opt(v, p);
    }

    /// Remove the piece at `id` from the tree and return its free-list slot
    /// for reuse by the next insertion.
    pub fn delete(&mut self, id: NodeId) {
        let mut y = id;
        let mut y_original_color = self.color(Some(y));
        let x;
        let x_parent;

        if self.left(id).is_none() {
            x = self.right(id);
            x_parent = self.parent(id);
            self.transplant(id, x);
        } else if self.right(id).is_none() {
            x = self.left(id);
            x_parent = self.parent(id);
            self.transplant(id, x);
        } else {
            y = self.min_under(self.right(id).unwrap());
            y_original_color = self.color(Some(y));
            x = self.right(y);
            if self.parent(y) == Some(id) {
                x_parent = Some(y);
                self.set_parent_opt(x, Some(y));
            } else {
                x_parent = self.parent(y);
                self.transplant(y, self.right(y));
                let right_of_id = self.right(id);
                self.set_right(y, right_of_id);
                self.set_parent_opt(self.right(y), Some(y));
            }
            self.transplant(id, Some(y));
            let left_of_id = self.left(id);
            self.set_left(y, left_of_id);
            self.set_parent_opt(self.left(y), Some(y));
            self.set_color(y, self.color(Some(id)));
        }

        self.recompute_path_to_root(x_parent);

        if y_original_color == Color::Black {
            self.delete_fixup(x, x_parent);
        }

        self.free(id);
    }

    fn delete_fixup(&mut self, mut x: Option<NodeId>, mut x_parent: Option<NodeId>) {
        while x != self.root && self.color(x) == Color::Black {
            let Some(p) = x_parent else { break };
            if x == self.left(p) {
                let mut w = self.right(p).unwrap();
                if self.color(Some(w)) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.rotate_left(p);
                    w = self.right(p).unwrap();
                }
                if self.color(self.left(w)) == Color::Black
                    && self.color(self.right(w)) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = Some(p);
                    x_parent = self.parent(p);
                } else {
                    if self.color(self.right(w)) == Color::Black {
                        if let Some(wl) = self.left(w) {
                            self.set_color(wl, Color::Black);
                        }
                        self.set_color(w, Color::Red);
                        self.rotate_right(w);
                        w = self.right(p).unwrap();
                    }
                    self.set_color(w, self.color(Some(p)));
                    self.set_color(p, Color::Black);
                    if let Some(wr) = self.right(w) {
                        self.set_color(wr, Color::Black);
                    }
                    self.rotate_left(p);
                    x = self.root;
                    x_parent = None;
                }
            } else {
                let mut w = self.left(p).unwrap();
                if self.color(Some(w)) == Color::Red {
                    self.set_color(w, Color::Black);
                    self.set_color(p, Color::Red);
                    self.rotate_right(p);
                    w = self.left(p).unwrap();
                }
                if self.color(self.right(w)) == Color::Black
                    && self.color(self.left(w)) == Color::Black
                {
                    self.set_color(w, Color::Red);
                    x = Some(p);
                    x_parent = self.parent(p);
                } else {
                    if self.color(self.left(w)) == Color::Black {
                        if let Some(wr) = self.right(w) {
                            self.set_color(wr, Color::Black);
                        }
                        self.set_color(w, Color::Red);
                        self.rotate_left(w);
                        w = self.left(p).unwrap();
                    }
                    self.set_color(w, self.color(Some(p)));
                    self.set_color(p, Color::Black);
                    if let Some(wl) = self.left(w) {
                        self.set_color(wl, Color::Black);
                    }
                    self.rotate_right(p);
                    x = self.root;
                    x_parent = None;
                }
            }
        }
        if let Some(x) = x {
            self.set_color(x, Color::Black);
        }
    }

    /// Panics if the red-black invariants or the cached aggregates are
    /// violated anywhere in the tree. Test-only consistency check, in the
    /// style of an augmented-tree invariant walker.
    #[cfg(test)]
    pub fn check_invariants(&self) {
        if let Some(root) = self.root {
            assert_eq!(self.color(Some(root)), Color::Black, "root must be black");
            let mut black_height = None;
            self.check_node(root, &mut black_height, 0);
        }
    }

    #[cfg(test)]
    fn check_node(&self, id: NodeId, black_height: &mut Option<usize>, depth_black: usize) {
        let n = self.node(id);
        let depth_black = depth_black + if n.color == Color::Black { 1 } else { 0 };

        if n.color == Color::Red {
            assert_eq!(
                self.color(n.left),
                Color::Black,
                "red node {} has a red child",
                id
            );
            assert_eq!(
                self.color(n.right),
                Color::Black,
                "red node {} has a red child",
                id
            );
        }

        match (n.left, n.right) {
            (None, None) => match black_height {
                None => *black_height = Some(depth_black),
                Some(bh) => assert_eq!(*bh, depth_black, "unequal black-height at leaf {}", id),
            },
            _ => {}
        }

        if let Some(l) = n.left {
            assert_eq!(self.parent(l), Some(id));
            self.check_node(l, black_height, depth_black);
        }
        if let Some(r) = n.right {
            assert_eq!(self.parent(r), Some(id));
            self.check_node(r, black_height, depth_black);
        }

        let expect_len = self.len_of(n.left) + n.piece.length + self.len_of(n.right);
        let expect_nl = self.newlines_of(n.left) + n.piece.newlines + self.newlines_of(n.right);
        assert_eq!(n.sub_len, expect_len, "stale length aggregate at {}", id);
        assert_eq!(
            n.sub_newlines, expect_nl,
            "stale newline aggregate at {}",
            id
        );
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
