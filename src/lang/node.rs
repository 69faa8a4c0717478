/// Binary arithmetic operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinOp {
    /// Apply the operator with IEEE-754 semantics: `left op right`.
    ///
    /// Division by zero yields an infinity or NaN, never an error.
    pub fn apply(self, left: f64, right: f64) -> f64 {
        match self {
            BinOp::Add => left + right,
            BinOp::Sub => left - right,
            BinOp::Mul => left * right,
            BinOp::Div => left / right,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            BinOp::Add => '+',
            BinOp::Sub => '-',
            BinOp::Mul => '*',
            BinOp::Div => '/',
        }
    }
}

/// Expression tree node.
///
/// Nodes are never mutated after construction; passes such as constant
/// folding build new trees.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal number: `3.5`.
    Immediate(f64),

    /// Positional parameter, resolved against the parameter list.
    Argument(usize),

    /// `left op right`.
    Binary {
        op: BinOp,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn binary(op: BinOp, left: Node, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Number of `Binary` nodes in the tree.
    pub fn binary_count(&self) -> usize {
        match self {
            Node::Immediate(_) | Node::Argument(_) => 0,
            Node::Binary { left, right, .. } => 1 + left.binary_count() + right.binary_count(),
        }
    }

    /// Number of leaves (`Immediate` and `Argument`) in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Immediate(_) | Node::Argument(_) => 1,
            Node::Binary { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

impl std::fmt::Display for Node {
    /// Fully parenthesized infix form; arguments print as `$index`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Immediate(n) => write!(f, "{}", n),
            Node::Argument(i) => write!(f, "${}", i),
            Node::Binary { op, left, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
        }
    }
}

/// A parsed function: its declared parameters and body.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub params: Vec<String>,
    pub body: Node,
}

impl Function {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}
