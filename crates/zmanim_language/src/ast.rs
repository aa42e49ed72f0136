//! Abstract syntax tree for formulas.
//!
//! The tree is a closed set of node kinds. Names that the grammar knows
//! (primitives, functions, directions, bases, condition variables) are
//! resolved to enums at parse time so evaluation can match exhaustively.

use std::fmt;

use zmanim_foundation::Arity;

use crate::span::Span;

/// A parsed formula expression.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    /// What this node is.
    pub kind: ExprKind,
    /// Where it appears in the formula text.
    pub span: Span,
}

impl Expr {
    /// Creates a new node.
    #[must_use]
    pub const fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the direct children of this node, in source order.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        match &self.kind {
            ExprKind::Call(_, args) => args.iter().collect(),
            ExprKind::Offset { base, .. } => vec![base.as_ref()],
            ExprKind::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut out = vec![condition.as_ref(), then_branch.as_ref()];
                if let Some(e) = else_branch {
                    out.push(e.as_ref());
                }
                out
            }
            ExprKind::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            ExprKind::CustomBase { start, end } => vec![start.as_ref(), end.as_ref()],
            ExprKind::Not(inner) | ExprKind::Negate(inner) => vec![inner.as_ref()],
            ExprKind::Primitive(_)
            | ExprKind::Reference(_)
            | ExprKind::Number(_)
            | ExprKind::Duration(_)
            | ExprKind::Condition(_)
            | ExprKind::Direction(_)
            | ExprKind::Base(_)
            | ExprKind::Date { .. }
            | ExprKind::Text(_)
            | ExprKind::Bool(_) => Vec::new(),
        }
    }

    /// Calls `f` on this node and every descendant, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }
}

/// Node kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// An astronomical event such as `visible_sunrise`.
    Primitive(Primitive),
    /// A function call with its arguments.
    Call(Function, Vec<Expr>),
    /// `@key`, resolved at evaluation time.
    Reference(String),
    /// `base ± <duration literal>`, with the signed offset in minutes.
    Offset {
        /// The expression being shifted.
        base: Box<Expr>,
        /// Signed offset in minutes.
        minutes: f64,
    },
    /// `if (condition) { then } else { else }`.
    Conditional {
        /// Boolean test.
        condition: Box<Expr>,
        /// Value when the test holds.
        then_branch: Box<Expr>,
        /// Value otherwise; absent means no event.
        else_branch: Option<Box<Expr>>,
    },
    /// Arithmetic, comparison or logical operator.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Logical negation.
    Not(Box<Expr>),
    /// Arithmetic negation of a non-literal.
    Negate(Box<Expr>),
    /// Number literal.
    Number(f64),
    /// Duration literal, in minutes.
    Duration(f64),
    /// A variable available to conditions, such as `latitude`.
    Condition(ConditionVar),
    /// A direction argument such as `before_visible_sunrise`.
    Direction(Direction),
    /// A named day definition such as `gra` or `mga_72`.
    Base(Base),
    /// `custom(start, end)` day definition.
    CustomBase {
        /// Start of the day.
        start: Box<Expr>,
        /// End of the day.
        end: Box<Expr>,
    },
    /// Date literal like `21-May`.
    Date {
        /// Day of month.
        day: u32,
        /// Month, 1 to 12.
        month: u32,
    },
    /// String literal.
    Text(String),
    /// `true` or `false`.
    Bool(bool),
}

// =============================================================================
// Primitives
// =============================================================================

/// Astronomical events usable as bare identifiers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Upper limb on the apparent horizon, corrected for elevation.
    VisibleSunrise,
    /// Upper limb on the apparent horizon, corrected for elevation.
    VisibleSunset,
    /// Centre on the geometric horizon.
    GeometricSunrise,
    /// Centre on the geometric horizon.
    GeometricSunset,
    /// Meridian transit.
    SolarNoon,
    /// Twelve hours before solar noon.
    SolarMidnight,
    /// Sun 6° below the horizon, morning.
    CivilDawn,
    /// Sun 6° below the horizon, evening.
    CivilDusk,
    /// Sun 12° below the horizon, morning.
    NauticalDawn,
    /// Sun 12° below the horizon, evening.
    NauticalDusk,
    /// Sun 18° below the horizon, morning.
    AstronomicalDawn,
    /// Sun 18° below the horizon, evening.
    AstronomicalDusk,
}

impl Primitive {
    /// Every primitive, in canonical order.
    pub const ALL: [Self; 12] = [
        Self::VisibleSunrise,
        Self::VisibleSunset,
        Self::GeometricSunrise,
        Self::GeometricSunset,
        Self::SolarNoon,
        Self::SolarMidnight,
        Self::CivilDawn,
        Self::CivilDusk,
        Self::NauticalDawn,
        Self::NauticalDusk,
        Self::AstronomicalDawn,
        Self::AstronomicalDusk,
    ];

    /// Looks up a primitive by name, including the `sunrise`/`sunset` aliases.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sunrise" => Some(Self::VisibleSunrise),
            "sunset" => Some(Self::VisibleSunset),
            _ => Self::ALL.into_iter().find(|p| p.name() == name),
        }
    }

    /// Canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::VisibleSunrise => "visible_sunrise",
            Self::VisibleSunset => "visible_sunset",
            Self::GeometricSunrise => "geometric_sunrise",
            Self::GeometricSunset => "geometric_sunset",
            Self::SolarNoon => "solar_noon",
            Self::SolarMidnight => "solar_midnight",
            Self::CivilDawn => "civil_dawn",
            Self::CivilDusk => "civil_dusk",
            Self::NauticalDawn => "nautical_dawn",
            Self::NauticalDusk => "nautical_dusk",
            Self::AstronomicalDawn => "astronomical_dawn",
            Self::AstronomicalDusk => "astronomical_dusk",
        }
    }
}

// =============================================================================
// Functions
// =============================================================================

/// Built-in functions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Function {
    /// `solar(degrees[, direction])`
    Solar,
    /// `seasonal_solar(degrees[, direction])`
    SeasonalSolar,
    /// `proportional_hours(hours, base)`
    ProportionalHours,
    /// `proportional_minutes(minutes, direction)`
    ProportionalMinutes,
    /// `midpoint(a, b)`
    Midpoint,
    /// `first_valid(a, b, ...)`
    FirstValid,
    /// `earlier_of(a, b)`
    EarlierOf,
    /// `later_of(a, b)`
    LaterOf,
}

impl Function {
    /// Every function, in canonical order.
    pub const ALL: [Self; 8] = [
        Self::Solar,
        Self::SeasonalSolar,
        Self::ProportionalHours,
        Self::ProportionalMinutes,
        Self::Midpoint,
        Self::FirstValid,
        Self::EarlierOf,
        Self::LaterOf,
    ];

    /// Looks up a function by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Solar => "solar",
            Self::SeasonalSolar => "seasonal_solar",
            Self::ProportionalHours => "proportional_hours",
            Self::ProportionalMinutes => "proportional_minutes",
            Self::Midpoint => "midpoint",
            Self::FirstValid => "first_valid",
            Self::EarlierOf => "earlier_of",
            Self::LaterOf => "later_of",
        }
    }

    /// Accepted argument counts.
    #[must_use]
    pub const fn arity(self) -> Arity {
        match self {
            Self::Solar | Self::SeasonalSolar => Arity::Range(1, 2),
            Self::FirstValid => Arity::Variadic(2),
            Self::ProportionalHours
            | Self::ProportionalMinutes
            | Self::Midpoint
            | Self::EarlierOf
            | Self::LaterOf => Arity::Exact(2),
        }
    }
}

// =============================================================================
// Directions
// =============================================================================

/// Which reference event an angle or offset is measured from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Before visible sunrise.
    BeforeVisibleSunrise,
    /// After visible sunrise.
    AfterVisibleSunrise,
    /// Before visible sunset.
    BeforeVisibleSunset,
    /// After visible sunset.
    AfterVisibleSunset,
    /// Before geometric sunrise.
    BeforeGeometricSunrise,
    /// After geometric sunrise.
    AfterGeometricSunrise,
    /// Before geometric sunset.
    BeforeGeometricSunset,
    /// After geometric sunset.
    AfterGeometricSunset,
    /// Morning side of solar noon.
    BeforeNoon,
    /// Evening side of solar noon.
    AfterNoon,
}

impl Direction {
    /// Every direction, in canonical order.
    pub const ALL: [Self; 10] = [
        Self::BeforeVisibleSunrise,
        Self::AfterVisibleSunrise,
        Self::BeforeVisibleSunset,
        Self::AfterVisibleSunset,
        Self::BeforeGeometricSunrise,
        Self::AfterGeometricSunrise,
        Self::BeforeGeometricSunset,
        Self::AfterGeometricSunset,
        Self::BeforeNoon,
        Self::AfterNoon,
    ];

    /// Looks up a direction by name, including the short `*_sunrise`/`*_sunset` aliases.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "before_sunrise" => Some(Self::BeforeVisibleSunrise),
            "after_sunrise" => Some(Self::AfterVisibleSunrise),
            "before_sunset" => Some(Self::BeforeVisibleSunset),
            "after_sunset" => Some(Self::AfterVisibleSunset),
            _ => Self::ALL.into_iter().find(|d| d.name() == name),
        }
    }

    /// Canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BeforeVisibleSunrise => "before_visible_sunrise",
            Self::AfterVisibleSunrise => "after_visible_sunrise",
            Self::BeforeVisibleSunset => "before_visible_sunset",
            Self::AfterVisibleSunset => "after_visible_sunset",
            Self::BeforeGeometricSunrise => "before_geometric_sunrise",
            Self::AfterGeometricSunrise => "after_geometric_sunrise",
            Self::BeforeGeometricSunset => "before_geometric_sunset",
            Self::AfterGeometricSunset => "after_geometric_sunset",
            Self::BeforeNoon => "before_noon",
            Self::AfterNoon => "after_noon",
        }
    }

    /// True for directions anchored on the morning side of the day.
    #[must_use]
    pub const fn is_morning(self) -> bool {
        matches!(
            self,
            Self::BeforeVisibleSunrise
                | Self::AfterVisibleSunrise
                | Self::BeforeGeometricSunrise
                | Self::AfterGeometricSunrise
                | Self::BeforeNoon
        )
    }

    /// True for directions pointing away from the day: before a sunrise or
    /// after a sunset. These are the ones `seasonal_solar` and
    /// `proportional_minutes` accept.
    #[must_use]
    pub const fn is_outward(self) -> bool {
        matches!(
            self,
            Self::BeforeVisibleSunrise
                | Self::AfterVisibleSunset
                | Self::BeforeGeometricSunrise
                | Self::AfterGeometricSunset
        )
    }
}

// =============================================================================
// Bases
// =============================================================================

/// A named definition of the halachic day for proportional hours.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Base {
    /// Sunrise to sunset.
    Gra,
    /// Fixed minutes before sunrise to the same after sunset (`mga_72` etc).
    MgaMinutes(u16),
    /// Proportional minutes: a day of 720 proportional minutes, extended by
    /// this many on both ends (`mga_72_zmanis` etc).
    MgaZmanis(u16),
    /// Dawn to dusk at a depression angle, in tenths of a degree (`mga_16_1` is 161).
    MgaDegrees(u16),
    /// Dawn to dusk at 1.583°.
    BaalHatanya,
    /// Sunrise to 40 minutes after sunset.
    AteretTorah,
}

impl Base {
    /// Every named base, in canonical order.
    pub const ALL: [Self; 15] = [
        Self::Gra,
        Self::MgaMinutes(60),
        Self::MgaMinutes(72),
        Self::MgaMinutes(90),
        Self::MgaMinutes(96),
        Self::MgaMinutes(120),
        Self::MgaZmanis(72),
        Self::MgaZmanis(90),
        Self::MgaZmanis(96),
        Self::MgaDegrees(161),
        Self::MgaDegrees(180),
        Self::MgaDegrees(198),
        Self::MgaDegrees(260),
        Self::BaalHatanya,
        Self::AteretTorah,
    ];

    /// Looks up a base by name. `mga` means `mga_72`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "mga" {
            return Some(Self::MgaMinutes(72));
        }
        Self::ALL.into_iter().find(|b| b.to_string() == name)
    }

    /// Depression angle in degrees for angle-based bases.
    #[must_use]
    pub fn degrees(self) -> Option<f64> {
        match self {
            Self::MgaDegrees(tenths) => Some(f64::from(tenths) / 10.0),
            Self::BaalHatanya => Some(1.583),
            _ => None,
        }
    }
}

impl fmt::Display for Base {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gra => f.write_str("gra"),
            Self::MgaMinutes(m) => write!(f, "mga_{m}"),
            Self::MgaZmanis(m) => write!(f, "mga_{m}_zmanis"),
            Self::MgaDegrees(tenths) if tenths % 10 == 0 => write!(f, "mga_{}", tenths / 10),
            Self::MgaDegrees(tenths) => write!(f, "mga_{}_{}", tenths / 10, tenths % 10),
            Self::BaalHatanya => f.write_str("baal_hatanya"),
            Self::AteretTorah => f.write_str("ateret_torah"),
        }
    }
}

// =============================================================================
// Condition variables and operators
// =============================================================================

/// Variables readable inside conditions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConditionVar {
    /// Degrees north.
    Latitude,
    /// Degrees east.
    Longitude,
    /// Meters above sea level.
    Elevation,
    /// Visible sunset minus visible sunrise.
    DayLength,
    /// Month, 1 to 12.
    Month,
    /// Day of month.
    Day,
    /// Day of year, 1 to 366.
    DayOfYear,
    /// Day of year, for comparison with date literals.
    Date,
    /// `"spring"`, `"summer"`, `"autumn"` or `"winter"` for the location's hemisphere.
    Season,
}

impl ConditionVar {
    /// Every condition variable.
    pub const ALL: [Self; 9] = [
        Self::Latitude,
        Self::Longitude,
        Self::Elevation,
        Self::DayLength,
        Self::Month,
        Self::Day,
        Self::DayOfYear,
        Self::Date,
        Self::Season,
    ];

    /// Looks up a variable by name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.name() == name)
    }

    /// Name as written in formulas.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Latitude => "latitude",
            Self::Longitude => "longitude",
            Self::Elevation => "elevation",
            Self::DayLength => "day_length",
            Self::Month => "month",
            Self::Day => "day",
            Self::DayOfYear => "day_of_year",
            Self::Date => "date",
            Self::Season => "season",
        }
    }
}

/// Binary operators.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinaryOp {
    /// Operator as written.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    /// True for `==`, `!=`, `<`, `<=`, `>` and `>=`.
    #[must_use]
    pub const fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }
}

/// Every bare word the grammar reserves, for completion and highlighting.
#[must_use]
pub fn known_identifiers() -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    names.extend(Primitive::ALL.iter().map(|p| p.name().to_string()));
    names.extend(["sunrise", "sunset"].map(String::from));
    names.extend(Function::ALL.iter().map(|f| f.name().to_string()));
    names.push("custom".to_string());
    names.extend(Direction::ALL.iter().map(|d| d.name().to_string()));
    names.extend(Base::ALL.iter().map(ToString::to_string));
    names.push("mga".to_string());
    names.extend(ConditionVar::ALL.iter().map(|v| v.name().to_string()));
    names.extend(["if", "else", "true", "false"].map(String::from));
    names.sort();
    names.dedup();
    names
}
