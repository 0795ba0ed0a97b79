use std::collections::HashMap;

use crate::bytecode::op::{Insn, Label};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stack-check error: {message}")]
pub struct StackCheckError {
    pub message: String,
}

impl StackCheckError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Computes the deepest operand stack `code` can reach, starting empty.
///
/// Follows every branch, so each instruction is visited with the stack
/// height of every path reaching it; all those heights must agree. Code
/// must end every path with `Return` or `Goto`.
pub fn max_stack(code: &[Insn]) -> Result<u16, StackCheckError> {
    let labels = label_positions(code)?;
    let mut heights: Vec<Option<usize>> = vec![None; code.len()];
    let mut pending: Vec<(usize, usize)> = vec![(0, 0)];
    let mut max = 0;

    while let Some((start, height)) = pending.pop() {
        let mut ip = start;
        let mut h = height;

        loop {
            let Some(insn) = code.get(ip) else {
                return Err(StackCheckError::new(format!(
                    "control falls off the end of the code at ip={}",
                    ip
                )));
            };

            match heights[ip] {
                Some(seen) if seen == h => break,
                Some(seen) => {
                    return Err(StackCheckError::new(format!(
                        "inconsistent stack height at ip={}: {} vs {}",
                        ip, seen, h
                    )));
                }
                None => heights[ip] = Some(h),
            }

            let (pops, pushes) = insn.stack_effect();
            if h < pops {
                return Err(StackCheckError::new(format!(
                    "stack underflow at ip={}, op={:?}, needed {} items",
                    ip, insn, pops
                )));
            }
            h = h - pops + pushes;
            max = max.max(h);

            if let Some(target) = insn.branch_target() {
                let dest = labels[&target];
                if matches!(insn, Insn::Goto(_)) {
                    ip = dest;
                    continue;
                }
                pending.push((dest, h));
            }

            if matches!(insn, Insn::Return) {
                break;
            }
            ip += 1;
        }
    }

    u16::try_from(max).map_err(|_| StackCheckError::new(format!("stack depth {} too large", max)))
}

fn label_positions(code: &[Insn]) -> Result<HashMap<Label, usize>, StackCheckError> {
    let mut positions = HashMap::new();
    for (ip, insn) in code.iter().enumerate() {
        if let Insn::Label(label) = insn {
            if positions.insert(*label, ip).is_some() {
                return Err(StackCheckError::new(format!("label {} placed twice", label)));
            }
        }
    }
    for insn in code {
        if let Some(target) = insn.branch_target() {
            if !positions.contains_key(&target) {
                return Err(StackCheckError::new(format!(
                    "branch to unplaced label {}",
                    target
                )));
            }
        }
    }
    Ok(positions)
}
