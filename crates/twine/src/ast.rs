//! Syntax tree for the scanned scripting language.
//!
//! A closed tagged-variant type with byte-range annotations on every node.
//! Traversal for the directive scan is driven by a fixed per-category child
//! table ([`Node::children`]); categories without a table entry are leaves and
//! terminate traversal.

/// Primitive literal value carried by a literal expression.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Str(String),
    Number(f64),
    Bool(bool),
    Null,
    Regex(String),
}

impl LiteralValue {
    /// Render the literal the way it would be coerced into a path argument.
    pub fn to_path_string(&self) -> String {
        match self {
            Self::Str(s) => s.clone(),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.is_finite() {
                    format!("{}", *n as i64)
                } else {
                    format!("{n}")
                }
            }
            Self::Bool(b) => b.to_string(),
            Self::Null => "null".to_owned(),
            Self::Regex(r) => r.clone(),
        }
    }
}

/// A syntax tree node: category plus the byte range it covers.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    /// Half-open byte range `(start, end)` within the source fragment.
    pub range: (usize, usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Program(Vec<Node>),

    // Statements
    Block(Vec<Node>),
    VarDeclaration(Vec<Node>),
    VarDeclarator {
        name: String,
        init: Option<Box<Node>>,
    },
    FunctionDecl {
        name: String,
        params: Vec<String>,
        body: Box<Node>,
    },
    ExpressionStmt(Box<Node>),
    If {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Option<Box<Node>>,
    },
    For {
        init: Option<Box<Node>>,
        test: Option<Box<Node>>,
        update: Option<Box<Node>>,
        body: Box<Node>,
    },
    ForIn {
        left: Box<Node>,
        right: Box<Node>,
        body: Box<Node>,
    },
    While {
        test: Box<Node>,
        body: Box<Node>,
    },
    DoWhile {
        body: Box<Node>,
        test: Box<Node>,
    },
    Switch {
        discriminant: Box<Node>,
        cases: Vec<Node>,
    },
    SwitchCase {
        test: Option<Box<Node>>,
        consequent: Vec<Node>,
    },
    Try {
        block: Box<Node>,
        handler: Option<Box<Node>>,
        finalizer: Option<Box<Node>>,
    },
    Catch {
        param: String,
        body: Box<Node>,
    },
    Throw(Box<Node>),
    Return(Option<Box<Node>>),
    Break(Option<String>),
    Continue(Option<String>),
    With {
        object: Box<Node>,
        body: Box<Node>,
    },
    Labeled {
        label: String,
        body: Box<Node>,
    },
    Empty,

    // Expressions
    Identifier(String),
    Literal(LiteralValue),
    This,
    Array(Vec<Node>),
    Object(Vec<Node>),
    Property {
        key: String,
        value: Box<Node>,
    },
    FunctionExpr {
        name: Option<String>,
        params: Vec<String>,
        body: Box<Node>,
    },
    Unary {
        op: &'static str,
        argument: Box<Node>,
    },
    Update {
        op: &'static str,
        prefix: bool,
        argument: Box<Node>,
    },
    Binary {
        op: &'static str,
        left: Box<Node>,
        right: Box<Node>,
    },
    Logical {
        op: &'static str,
        left: Box<Node>,
        right: Box<Node>,
    },
    Assignment {
        op: &'static str,
        left: Box<Node>,
        right: Box<Node>,
    },
    Conditional {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    Call {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    New {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    Member {
        object: Box<Node>,
        property: Box<Node>,
        computed: bool,
    },
    Sequence(Vec<Node>),
}

impl Node {
    pub fn new(kind: NodeKind, range: (usize, usize)) -> Self {
        Self { kind, range }
    }

    /// Traversable children per the fixed node-category table.
    ///
    /// The table deliberately mirrors the dispatch used by the directive
    /// scanner: call and new expressions expose their arguments (not the
    /// callee), object literals expose property values, `if` exposes its
    /// branches, and loop statements expose their bodies. Categories not
    /// listed here have no children.
    pub fn children(&self) -> Vec<&Node> {
        fn opt(node: &Option<Box<Node>>) -> Vec<&Node> {
            node.as_deref().into_iter().collect()
        }

        match &self.kind {
            NodeKind::Program(body) | NodeKind::Block(body) => body.iter().collect(),
            NodeKind::VarDeclaration(declarators) => declarators.iter().collect(),
            NodeKind::VarDeclarator { init, .. } => opt(init),
            NodeKind::FunctionDecl { body, .. } | NodeKind::FunctionExpr { body, .. } => {
                vec![body]
            }
            NodeKind::ExpressionStmt(expr) | NodeKind::Throw(expr) => vec![expr],
            NodeKind::If {
                consequent,
                alternate,
                ..
            } => {
                let mut result = vec![consequent.as_ref()];
                result.extend(alternate.as_deref());
                result
            }
            NodeKind::For { body, .. }
            | NodeKind::ForIn { body, .. }
            | NodeKind::DoWhile { body, .. }
            | NodeKind::Catch { body, .. } => vec![body],
            NodeKind::While { test, body } => vec![test, body],
            NodeKind::With { object, body } => vec![object, body],
            NodeKind::Switch {
                discriminant,
                cases,
            } => {
                let mut result: Vec<&Node> = cases.iter().collect();
                result.push(discriminant);
                result
            }
            NodeKind::SwitchCase { test, consequent } => {
                let mut result: Vec<&Node> = consequent.iter().collect();
                result.extend(test.as_deref());
                result
            }
            NodeKind::Try {
                block,
                handler,
                finalizer,
            } => {
                let mut result = vec![block.as_ref()];
                result.extend(handler.as_deref());
                result.extend(finalizer.as_deref());
                result
            }
            NodeKind::Return(argument) => opt(argument),
            NodeKind::Array(elements) | NodeKind::Sequence(elements) => elements.iter().collect(),
            NodeKind::Object(properties) => properties
                .iter()
                .filter_map(|p| match &p.kind {
                    NodeKind::Property { value, .. } => Some(value.as_ref()),
                    _ => None,
                })
                .collect(),
            NodeKind::Unary { argument, .. } | NodeKind::Update { argument, .. } => {
                vec![argument]
            }
            NodeKind::Binary { left, right, .. }
            | NodeKind::Logical { left, right, .. }
            | NodeKind::Assignment { left, right, .. } => vec![left, right],
            NodeKind::Conditional {
                test,
                consequent,
                alternate,
            } => vec![test, alternate, consequent],
            NodeKind::Call { arguments, .. } | NodeKind::New { arguments, .. } => {
                arguments.iter().collect()
            }
            NodeKind::Member {
                object, property, ..
            } => vec![object, property],
            // Leaves: identifiers, literals, labels, jumps, empty statements.
            _ => Vec::new(),
        }
    }

    /// The name bound by a scope-introducing declaration, if this node is one.
    ///
    /// Used for the shadowing rule: a function declaration or variable
    /// declarator binding the directive name hides every directive-named call
    /// in its subtree and in later siblings.
    pub fn declared_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::FunctionDecl { name, .. } => Some(name),
            NodeKind::VarDeclarator { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The plain identifier this expression names, if any.
    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier(name) => Some(name),
            _ => None,
        }
    }

    /// Esprima-style category name, used in diagnostics.
    pub fn category(&self) -> &'static str {
        match &self.kind {
            NodeKind::Program(_) => "Program",
            NodeKind::Block(_) => "BlockStatement",
            NodeKind::VarDeclaration(_) => "VariableDeclaration",
            NodeKind::VarDeclarator { .. } => "VariableDeclarator",
            NodeKind::FunctionDecl { .. } => "FunctionDeclaration",
            NodeKind::ExpressionStmt(_) => "ExpressionStatement",
            NodeKind::If { .. } => "IfStatement",
            NodeKind::For { .. } => "ForStatement",
            NodeKind::ForIn { .. } => "ForInStatement",
            NodeKind::While { .. } => "WhileStatement",
            NodeKind::DoWhile { .. } => "DoWhileStatement",
            NodeKind::Switch { .. } => "SwitchStatement",
            NodeKind::SwitchCase { .. } => "SwitchCase",
            NodeKind::Try { .. } => "TryStatement",
            NodeKind::Catch { .. } => "CatchClause",
            NodeKind::Throw(_) => "ThrowStatement",
            NodeKind::Return(_) => "ReturnStatement",
            NodeKind::Break(_) => "BreakStatement",
            NodeKind::Continue(_) => "ContinueStatement",
            NodeKind::With { .. } => "WithStatement",
            NodeKind::Labeled { .. } => "LabeledStatement",
            NodeKind::Empty => "EmptyStatement",
            NodeKind::Identifier(_) => "Identifier",
            NodeKind::Literal(_) => "Literal",
            NodeKind::This => "ThisExpression",
            NodeKind::Array(_) => "ArrayExpression",
            NodeKind::Object(_) => "ObjectExpression",
            NodeKind::Property { .. } => "Property",
            NodeKind::FunctionExpr { .. } => "FunctionExpression",
            NodeKind::Unary { .. } => "UnaryExpression",
            NodeKind::Update { .. } => "UpdateExpression",
            NodeKind::Binary { .. } => "BinaryExpression",
            NodeKind::Logical { .. } => "LogicalExpression",
            NodeKind::Assignment { .. } => "AssignmentExpression",
            NodeKind::Conditional { .. } => "ConditionalExpression",
            NodeKind::Call { .. } => "CallExpression",
            NodeKind::New { .. } => "NewExpression",
            NodeKind::Member { .. } => "MemberExpression",
            NodeKind::Sequence(_) => "SequenceExpression",
        }
    }
}
