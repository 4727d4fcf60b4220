//! Merkle tree over redemption branch hashes
//!
//! Leaves hash as `sha256(0x01 || leaf)`, nodes as `sha256(0x02 || left || right)`.
//! A list splits at `ceil(n / 2)`. Each proof is `(bitpath, hashes)`: `hashes`
//! lists the sibling hashes from the leaf up, and bit `i` of `bitpath` is set
//! when the node at depth `i` is a right child.

use std::collections::HashMap;

use crate::types::{sha256, Bytes32, Program};

const LEAF_PREFIX: u8 = 0x01;
const NODE_PREFIX: u8 = 0x02;

/// Inclusion proof for one leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleProof {
    pub bitpath: u64,
    pub hashes: Vec<Bytes32>,
}

impl MerkleProof {
    /// Proof as the program `(bitpath . (hash1 hash2 ...))`
    pub fn to_program(&self) -> Program {
        Program::cons(
            Program::int(self.bitpath as i128),
            Program::list(self.hashes.iter().copied().map(Program::hash)),
        )
    }

    /// Fold the proof back into a root
    pub fn root_for(&self, leaf: &Bytes32) -> Bytes32 {
        let mut node = sha256(&[&[LEAF_PREFIX], leaf.as_ref()]);
        for (depth, sibling) in self.hashes.iter().enumerate() {
            node = if self.bitpath >> depth & 1 == 1 {
                sha256(&[&[NODE_PREFIX], sibling.as_ref(), node.as_ref()])
            } else {
                sha256(&[&[NODE_PREFIX], node.as_ref(), sibling.as_ref()])
            };
        }
        node
    }
}

#[derive(Debug, Clone)]
pub struct MerkleTree {
    root: Bytes32,
    proofs: HashMap<Bytes32, MerkleProof>,
}

impl MerkleTree {
    /// Build from leaf hashes; None for an empty list
    pub fn new(leaves: &[Bytes32]) -> Option<Self> {
        if leaves.is_empty() {
            return None;
        }
        let (root, proofs) = build(leaves);
        Some(Self {
            root,
            proofs: proofs.into_iter().collect(),
        })
    }

    pub fn root(&self) -> Bytes32 {
        self.root
    }

    pub fn proof(&self, leaf: &Bytes32) -> Option<&MerkleProof> {
        self.proofs.get(leaf)
    }
}

fn build(leaves: &[Bytes32]) -> (Bytes32, Vec<(Bytes32, MerkleProof)>) {
    if let [leaf] = leaves {
        let proof = MerkleProof {
            bitpath: 0,
            hashes: Vec::new(),
        };
        return (sha256(&[&[LEAF_PREFIX], leaf.as_ref()]), vec![(*leaf, proof)]);
    }

    let midpoint = (leaves.len() + 1) / 2;
    let (left_root, mut left) = build(&leaves[..midpoint]);
    let (right_root, right) = build(&leaves[midpoint..]);

    for (_, proof) in left.iter_mut() {
        proof.hashes.push(right_root);
    }
    for (leaf, mut proof) in right {
        proof.bitpath |= 1 << proof.hashes.len();
        proof.hashes.push(left_root);
        left.push((leaf, proof));
    }

    let root = sha256(&[&[NODE_PREFIX], left_root.as_ref(), right_root.as_ref()]);
    (root, left)
}
