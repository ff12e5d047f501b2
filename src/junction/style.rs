use serde::{Deserialize, Serialize};

/// Shape policy of a node.
///
/// The variant set is closed; every per-variant rule is a `match` on the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeStyle {
    /// Seamless continuation of one road through a two-segment node.
    Middle,
    /// Direction or width change between two segments.
    Bend,
    /// Straight pass-through whose width may be stretched.
    Stretch,
    /// Straight pass-through carrying a pedestrian crossing.
    Crossing,
    /// Pass-through with room for U-turns.
    UTurn,
    /// Fully editable junction.
    Custom,
    /// Dead end of a single segment.
    End,
}

/// Granularity at which an attribute can be edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportOption {
    /// Not editable; the style default always applies.
    None,
    /// Editable for the node as a whole.
    Group,
    /// Editable per segment end.
    Individually,
    /// Editable both ways.
    All,
}

impl SupportOption {
    /// Whether node-wide editing is allowed.
    #[must_use]
    pub fn group(self) -> bool {
        matches!(self, Self::Group | Self::All)
    }

    /// Whether per-segment-end editing is allowed.
    #[must_use]
    pub fn individually(self) -> bool {
        matches!(self, Self::Individually | Self::All)
    }
}

/// Editable attribute of a node or segment end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Offset,
    Shift,
    Rotate,
    Slope,
    Twist,
    Stretch,
    Marking,
    Collision,
    ForceNodeless,
    FollowMainSlope,
    DeltaHeight,
    CornerDelta,
}

impl Attribute {
    /// Every attribute.
    pub const ALL: [Self; 12] = [
        Self::Offset,
        Self::Shift,
        Self::Rotate,
        Self::Slope,
        Self::Twist,
        Self::Stretch,
        Self::Marking,
        Self::Collision,
        Self::ForceNodeless,
        Self::FollowMainSlope,
        Self::DeltaHeight,
        Self::CornerDelta,
    ];

    /// Stable name used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Offset => "offset",
            Self::Shift => "shift",
            Self::Rotate => "rotate",
            Self::Slope => "slope",
            Self::Twist => "twist",
            Self::Stretch => "stretch",
            Self::Marking => "marking",
            Self::Collision => "collision",
            Self::ForceNodeless => "force-nodeless",
            Self::FollowMainSlope => "follow-main-slope",
            Self::DeltaHeight => "delta-height",
            Self::CornerDelta => "corner-delta",
        }
    }

    /// Whether the attribute holds a boolean rather than a scalar.
    #[must_use]
    pub fn is_flag(self) -> bool {
        matches!(
            self,
            Self::Marking | Self::Collision | Self::ForceNodeless | Self::FollowMainSlope
        )
    }

    /// Tolerance under which a value counts as equal to its default.
    #[must_use]
    pub fn default_tolerance(self) -> f64 {
        match self {
            Self::Offset => 0.1,
            Self::Shift => 0.01,
            Self::Rotate | Self::Slope | Self::Twist => 0.1,
            Self::Stretch | Self::DeltaHeight | Self::CornerDelta => 0.001,
            Self::Marking | Self::Collision | Self::ForceNodeless | Self::FollowMainSlope => 0.0,
        }
    }
}

/// Geometric summary of a node used to validate styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeShape {
    /// Number of incident segment ends.
    pub count: usize,
    /// Two segment ends leaving in opposite directions.
    pub is_straight: bool,
    /// All segment ends share one width.
    pub same_width: bool,
}

impl NodeStyle {
    /// Every style variant.
    pub const ALL: [Self; 7] = [
        Self::Middle,
        Self::Bend,
        Self::Stretch,
        Self::Crossing,
        Self::UTurn,
        Self::Custom,
        Self::End,
    ];

    /// Stable name used in diagnostics.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Middle => "middle",
            Self::Bend => "bend",
            Self::Stretch => "stretch",
            Self::Crossing => "crossing",
            Self::UTurn => "u-turn",
            Self::Custom => "custom",
            Self::End => "end",
        }
    }

    /// Editing granularity of `attribute` under this style.
    #[must_use]
    pub fn support(self, attribute: Attribute) -> SupportOption {
        use Attribute as A;
        use SupportOption as S;

        match (self, attribute) {
            (Self::Custom, A::Collision | A::ForceNodeless | A::FollowMainSlope)
            | (Self::Custom | Self::Bend, A::DeltaHeight)
            | (Self::Custom | Self::End, A::CornerDelta)
            | (Self::Bend, A::Slope | A::Twist)
            | (Self::Crossing | Self::UTurn, A::Marking) => S::Individually,

            (Self::Custom, _)
            | (Self::Bend | Self::Crossing | Self::UTurn, A::Offset | A::Rotate)
            | (Self::Bend, A::Shift | A::Stretch) => S::All,

            (
                Self::Middle | Self::Stretch,
                A::Shift | A::Rotate | A::Slope | A::Twist | A::Stretch | A::DeltaHeight,
            ) => S::Group,

            (
                Self::End,
                A::Offset
                | A::Shift
                | A::Rotate
                | A::Slope
                | A::Twist
                | A::Stretch
                | A::DeltaHeight,
            ) => S::Individually,

            _ => S::None,
        }
    }

    /// Default value of a scalar attribute.
    #[must_use]
    pub fn default_value(self, attribute: Attribute) -> f64 {
        match attribute {
            Attribute::Stretch => 1.0,
            _ => 0.0,
        }
    }

    /// Default value of a flag attribute.
    #[must_use]
    pub fn default_flag(self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::Collision => true,
            Attribute::FollowMainSlope => self == Self::Custom,
            Attribute::Marking => !matches!(self, Self::Middle | Self::Stretch),
            _ => false,
        }
    }

    /// Extra distance corners keep beyond their intersection limit.
    #[must_use]
    pub fn additional_offset(self) -> f64 {
        match self {
            Self::Crossing => 2.0,
            Self::UTurn => 8.0,
            Self::Middle | Self::Bend | Self::Stretch | Self::Custom | Self::End => 0.0,
        }
    }

    /// Styles that draw no node mesh; their segment ends are not trimmed.
    #[must_use]
    pub fn is_nodeless(self) -> bool {
        matches!(self, Self::Middle | Self::Stretch)
    }

    /// Whether node-wide slope and twist are mirrored onto the main pair.
    #[must_use]
    pub fn mirrors_main_road(self) -> bool {
        matches!(self, Self::Middle | Self::Stretch)
    }

    /// Whether this style may be applied to a node of the given shape.
    #[must_use]
    pub fn is_valid(self, shape: NodeShape) -> bool {
        match shape.count {
            0 => false,
            1 => self == Self::End,
            2 => match self {
                Self::Middle => shape.is_straight && shape.same_width,
                Self::Stretch | Self::Crossing => shape.is_straight,
                Self::Bend | Self::UTurn | Self::Custom => true,
                Self::End => false,
            },
            _ => self == Self::Custom,
        }
    }

    /// Style picked for a node nobody has styled explicitly.
    #[must_use]
    pub fn default_for(shape: NodeShape) -> Self {
        match shape.count {
            1 => Self::End,
            2 if shape.is_straight && shape.same_width => Self::Middle,
            2 => Self::Bend,
            _ => Self::Custom,
        }
    }
}
