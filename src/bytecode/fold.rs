use crate::lang::Node;

/// Constant folding.
///
/// Returns a new tree in which every subtree made only of immediates is
/// replaced by one `Immediate` holding its value. Subtrees that reach an
/// `Argument` keep their shape. Operands are never reordered, so the folded
/// tree computes exactly what the original does, IEEE-754 quirks included.
pub fn fold(node: &Node) -> Node {
    match node {
        Node::Immediate(_) | Node::Argument(_) => node.clone(),
        Node::Binary { op, left, right } => {
            let left = fold(left);
            let right = fold(right);
            match (&left, &right) {
                (Node::Immediate(a), Node::Immediate(b)) => Node::Immediate(op.apply(*a, *b)),
                _ => Node::binary(*op, left, right),
            }
        }
    }
}
