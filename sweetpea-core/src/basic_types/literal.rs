use super::Var;

/// A possibly negated [`Var`], stored in its DIMACS form: the variable id, negative when the
/// literal is negated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    code: i32,
}

impl Literal {
    pub fn new(variable: Var, is_positive: bool) -> Literal {
        let code = variable.id() as i32;
        Literal {
            code: if is_positive { code } else { -code },
        }
    }

    pub fn is_positive(self) -> bool {
        self.code > 0
    }

    pub fn variable(self) -> Var {
        Var::new(self.code.unsigned_abs())
    }

    pub fn to_i32(self) -> i32 {
        self.code
    }
}

impl std::ops::Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal { code: -self.code }
    }
}

impl From<Var> for Literal {
    fn from(variable: Var) -> Self {
        variable.positive()
    }
}

impl std::fmt::Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}
