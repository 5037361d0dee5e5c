use crate::syntax::{Statement, Terminator};
use slangc_utils::{idx::Idx, index_vec::IdxVec};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BasicBlock(usize);

/// Every body's first basic block, by construction.
pub const ENTRY_BLOCK: BasicBlock = BasicBlock(0);

impl Idx for BasicBlock {
    fn new(idx: usize) -> Self {
        BasicBlock(idx)
    }

    fn idx(&self) -> usize {
        self.0
    }

    fn incr(&mut self) {
        self.0 += 1;
    }

    fn incr_by(&mut self, by: usize) {
        self.0 += by;
    }
}

#[derive(Debug)]
pub struct BasicBlockData {
    pub statements: Vec<Statement>,
    pub terminator: Terminator,
}

impl BasicBlockData {
    pub fn new(terminator: Terminator) -> Self {
        BasicBlockData {
            statements: Vec::new(),
            terminator,
        }
    }
}

pub struct BasicBlocks {
    basic_blocks: IdxVec<BasicBlock, BasicBlockData>,
}

impl BasicBlocks {
    pub fn new(basic_blocks: IdxVec<BasicBlock, BasicBlockData>) -> Self {
        BasicBlocks { basic_blocks }
    }

    pub fn push(&mut self, data: BasicBlockData) -> BasicBlock {
        self.basic_blocks.push(data)
    }

    pub fn len(&self) -> usize {
        self.basic_blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.basic_blocks.is_empty()
    }
}
