//! Constants and unary functions recognized in expressions.

/// Value pushed for the `pi` keyword.
#[allow(clippy::approx_constant)]
pub const PI: f64 = 3.14159265358979;

/// Value pushed for the `e` keyword.
#[allow(clippy::approx_constant)]
pub const E: f64 = 2.71828182845905;

/// Anything closer to zero than this is treated as zero by the domain checks.
const EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Sin,
    Cos,
    Tan,
    Csc,
    Sec,
    Cot,
    Asin,
    Acos,
    Atan,
    Acsc,
    Asec,
    Acot,
    Ln,
    Log,
    Exp,
}

impl Builtin {
    pub const ALL: [Builtin; 15] = [
        Builtin::Sin,
        Builtin::Cos,
        Builtin::Tan,
        Builtin::Csc,
        Builtin::Sec,
        Builtin::Cot,
        Builtin::Asin,
        Builtin::Acos,
        Builtin::Atan,
        Builtin::Acsc,
        Builtin::Asec,
        Builtin::Acot,
        Builtin::Ln,
        Builtin::Log,
        Builtin::Exp,
    ];

    /// Looks up a function by its exact (case-sensitive) name.
    pub fn from_name(name: &str) -> Option<Builtin> {
        use Builtin::*;

        let builtin = match name {
            "sin" => Sin,
            "cos" => Cos,
            "tan" => Tan,
            "csc" => Csc,
            "sec" => Sec,
            "cot" => Cot,
            "asin" => Asin,
            "acos" => Acos,
            "atan" => Atan,
            "acsc" => Acsc,
            "asec" => Asec,
            "acot" => Acot,
            "ln" => Ln,
            "log" => Log,
            "exp" => Exp,
            _ => return None,
        };

        Some(builtin)
    }

    pub fn name(self) -> &'static str {
        use Builtin::*;

        match self {
            Sin => "sin",
            Cos => "cos",
            Tan => "tan",
            Csc => "csc",
            Sec => "sec",
            Cot => "cot",
            Asin => "asin",
            Acos => "acos",
            Atan => "atan",
            Acsc => "acsc",
            Asec => "asec",
            Acot => "acot",
            Ln => "ln",
            Log => "log",
            Exp => "exp",
        }
    }

    /// Applies the function to `x`.
    ///
    /// Returns `None` if the function is undefined at `x`.
    pub fn apply(self, x: f64) -> Option<f64> {
        use Builtin::*;

        let result = match self {
            Sin => x.sin(),
            Cos => x.cos(),
            Tan => {
                if x.cos().abs() < EPSILON {
                    return None;
                }
                x.tan()
            }
            Csc => {
                let sin = x.sin();
                if sin.abs() < EPSILON {
                    return None;
                }
                1.0 / sin
            }
            Sec => {
                let cos = x.cos();
                if cos.abs() < EPSILON {
                    return None;
                }
                1.0 / cos
            }
            Cot => {
                let sin = x.sin();
                if sin.abs() < EPSILON {
                    return None;
                }
                x.cos() / sin
            }
            Asin | Acos if x.abs() > 1.0 => return None,
            Asin => x.asin(),
            Acos => x.acos(),
            Atan => x.atan(),
            Acsc | Asec if x.abs() < 1.0 => return None,
            Acsc => (1.0 / x).asin(),
            Asec => (1.0 / x).acos(),
            Acot => PI / 2.0 - x.atan(),
            Ln | Log if x < EPSILON => return None,
            Ln => x.ln(),
            Log => x.log10(),
            Exp => x.exp(),
        };

        Some(result)
    }
}

impl std::fmt::Display for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
