//! Script Programs
//!
//! Puzzles and solutions are binary trees of byte atoms. This module covers the
//! parts the staking core needs: building trees, the sha256 tree hash that
//! identifies a puzzle, currying arguments into a module, and the canonical
//! serialization handed to the script interpreter.
//!
//! Evaluation is out of scope; the interpreter is an external collaborator.

use thiserror::Error;

use super::bytes::{sha256, Bytes32};

const PAIR_PREFIX: u8 = 0xff;
const NIL_BYTE: u8 = 0x80;
const MAX_SINGLE_BYTE: u8 = 0x7f;

/// Operator atoms used when currying
const OP_QUOTE: u8 = 1;
const OP_APPLY: u8 = 2;
const OP_CONS: u8 = 4;

/// Script program: either a byte atom or a pair of programs
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Program {
    Atom(Vec<u8>),
    Pair(Box<Program>, Box<Program>),
}

impl Default for Program {
    fn default() -> Self {
        Self::nil()
    }
}

impl Program {
    /// The empty atom, also the list terminator
    pub fn nil() -> Self {
        Program::Atom(Vec::new())
    }

    pub fn atom(bytes: impl Into<Vec<u8>>) -> Self {
        Program::Atom(bytes.into())
    }

    /// Integer atom in minimal signed big-endian encoding
    pub fn int(value: i128) -> Self {
        Program::Atom(int_to_bytes(value))
    }

    pub fn hash(value: Bytes32) -> Self {
        Program::Atom(value.0.to_vec())
    }

    pub fn cons(first: Program, rest: Program) -> Self {
        Program::Pair(Box::new(first), Box::new(rest))
    }

    /// Proper list terminated by nil
    pub fn list<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Program>,
        I::IntoIter: DoubleEndedIterator,
    {
        items
            .into_iter()
            .rev()
            .fold(Program::nil(), |rest, item| Program::cons(item, rest))
    }

    pub fn as_atom(&self) -> Option<&[u8]> {
        match self {
            Program::Atom(bytes) => Some(bytes),
            Program::Pair(..) => None,
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Program::Atom(bytes) if bytes.is_empty())
    }

    pub fn first(&self) -> Option<&Program> {
        match self {
            Program::Pair(first, _) => Some(first),
            Program::Atom(_) => None,
        }
    }

    pub fn rest(&self) -> Option<&Program> {
        match self {
            Program::Pair(_, rest) => Some(rest),
            Program::Atom(_) => None,
        }
    }

    /// Items of a proper (or improper) list, stopping at the first atom
    pub fn iter_list(&self) -> ListIter<'_> {
        ListIter { current: self }
    }

    /// sha256 tree hash: atoms hash as sha256(1 || atom), pairs as sha256(2 || l || r)
    pub fn tree_hash(&self) -> Bytes32 {
        match self {
            Program::Atom(bytes) => hash_atom(bytes),
            Program::Pair(first, rest) => hash_pair(&first.tree_hash(), &rest.tree_hash()),
        }
    }

    /// Curry `args` into this module: `(a (q . MOD) (c (q . arg1) (c (q . arg2) 1)))`
    pub fn curry(&self, args: Vec<Program>) -> Program {
        let env = args.into_iter().rev().fold(Program::int(1), |rest, arg| {
            Program::list([
                Program::int(OP_CONS as i128),
                Program::cons(Program::int(OP_QUOTE as i128), arg),
                rest,
            ])
        });

        Program::list([
            Program::int(OP_APPLY as i128),
            Program::cons(Program::int(OP_QUOTE as i128), self.clone()),
            env,
        ])
    }

    /// Canonical serialization
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Program::Pair(first, rest) => {
                out.push(PAIR_PREFIX);
                first.write_to(out);
                rest.write_to(out);
            }
            Program::Atom(bytes) => write_atom(bytes, out),
        }
    }

    /// Parse the canonical serialization; trailing bytes are rejected
    pub fn from_bytes(bytes: &[u8]) -> Result<Program, ProgramError> {
        let mut cursor = 0usize;
        let program = read_program(bytes, &mut cursor)?;
        if cursor != bytes.len() {
            return Err(ProgramError::TrailingBytes(bytes.len() - cursor));
        }
        Ok(program)
    }
}

pub struct ListIter<'a> {
    current: &'a Program,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Program;

    fn next(&mut self) -> Option<Self::Item> {
        match self.current {
            Program::Pair(first, rest) => {
                self.current = rest;
                Some(first)
            }
            Program::Atom(_) => None,
        }
    }
}

/// Program parse errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProgramError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("atom size prefix too long")]
    BadSizePrefix,
    #[error("{0} trailing bytes after program")]
    TrailingBytes(usize),
}

fn write_atom(bytes: &[u8], out: &mut Vec<u8>) {
    let len = bytes.len();
    if len == 0 {
        out.push(NIL_BYTE);
        return;
    }
    if len == 1 && bytes[0] <= MAX_SINGLE_BYTE {
        out.push(bytes[0]);
        return;
    }
    if len < 0x40 {
        out.push(0x80 | len as u8);
    } else if len < 0x2000 {
        out.push(0xc0 | (len >> 8) as u8);
        out.push(len as u8);
    } else if len < 0x10_0000 {
        out.push(0xe0 | (len >> 16) as u8);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    } else if len < 0x800_0000 {
        out.push(0xf0 | (len >> 24) as u8);
        out.push((len >> 16) as u8);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    } else {
        out.push(0xf8 | (len >> 32) as u8);
        out.push((len >> 24) as u8);
        out.push((len >> 16) as u8);
        out.push((len >> 8) as u8);
        out.push(len as u8);
    }
    out.extend_from_slice(bytes);
}

fn read_byte(bytes: &[u8], cursor: &mut usize) -> Result<u8, ProgramError> {
    let b = *bytes.get(*cursor).ok_or(ProgramError::UnexpectedEof)?;
    *cursor += 1;
    Ok(b)
}

fn read_program(bytes: &[u8], cursor: &mut usize) -> Result<Program, ProgramError> {
    let b = read_byte(bytes, cursor)?;
    if b == PAIR_PREFIX {
        let first = read_program(bytes, cursor)?;
        let rest = read_program(bytes, cursor)?;
        return Ok(Program::cons(first, rest));
    }
    if b <= MAX_SINGLE_BYTE {
        return Ok(Program::Atom(vec![b]));
    }
    if b == NIL_BYTE {
        return Ok(Program::nil());
    }

    let mut prefix_bytes = 0u32;
    let mut mask = 0x80u8;
    let mut head = b;
    while head & mask != 0 {
        prefix_bytes += 1;
        head &= !mask;
        mask >>= 1;
    }
    if prefix_bytes > 5 {
        return Err(ProgramError::BadSizePrefix);
    }

    let mut size = head as u64;
    for _ in 1..prefix_bytes {
        size = (size << 8) | read_byte(bytes, cursor)? as u64;
    }

    let size = usize::try_from(size).map_err(|_| ProgramError::BadSizePrefix)?;
    let end = cursor.checked_add(size).ok_or(ProgramError::UnexpectedEof)?;
    let atom = bytes.get(*cursor..end).ok_or(ProgramError::UnexpectedEof)?;
    *cursor = end;
    Ok(Program::Atom(atom.to_vec()))
}

pub fn hash_atom(bytes: &[u8]) -> Bytes32 {
    sha256(&[&[1u8], bytes])
}

pub fn hash_pair(first: &Bytes32, rest: &Bytes32) -> Bytes32 {
    sha256(&[&[2u8], first.as_ref(), rest.as_ref()])
}

/// Tree hash of `MOD` curried with arguments, computed from hashes alone
///
/// Matches `Program::curry(..).tree_hash()` without needing the module or
/// argument programs themselves.
pub fn curry_tree_hash(mod_hash: &Bytes32, arg_hashes: &[Bytes32]) -> Bytes32 {
    let quote = hash_atom(&[OP_QUOTE]);
    let apply = hash_atom(&[OP_APPLY]);
    let cons = hash_atom(&[OP_CONS]);
    let nil = hash_atom(&[]);

    let env = arg_hashes
        .iter()
        .rev()
        .fold(hash_atom(&[1u8]), |rest, arg| {
            hash_pair(
                &cons,
                &hash_pair(&hash_pair(&quote, arg), &hash_pair(&rest, &nil)),
            )
        });

    let quoted_mod = hash_pair(&quote, mod_hash);
    hash_pair(&apply, &hash_pair(&quoted_mod, &hash_pair(&env, &nil)))
}

/// Minimal signed big-endian encoding (zero is the empty atom)
pub fn int_to_bytes(value: i128) -> Vec<u8> {
    if value == 0 {
        return Vec::new();
    }
    let full = value.to_be_bytes();
    let mut start = 0;
    while start < full.len() - 1 {
        let (cur, next) = (full[start], full[start + 1]);
        let redundant = (cur == 0x00 && next & 0x80 == 0) || (cur == 0xff && next & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    full[start..].to_vec()
}

/// Decode a non-negative atom as u64; None for negative or oversized values
pub fn atom_to_u64(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return Some(0);
    }
    if bytes[0] & 0x80 != 0 {
        return None;
    }
    let trimmed: &[u8] = {
        let skip = bytes.iter().take_while(|b| **b == 0).count();
        &bytes[skip..]
    };
    if trimmed.len() > 8 {
        return None;
    }
    Some(trimmed.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64))
}
