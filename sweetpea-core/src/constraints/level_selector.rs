use crate::basic_types::DesignError;
use crate::design::Factor;

/// The level, or all levels of a factor, that a sequence constraint is about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelSelector {
    /// Every level of the factor, each on its own.
    Factor { factor: String, levels: Vec<String> },
    Level { factor: String, level: String },
}

impl LevelSelector {
    /// Select a single level of `factor`; fails if `level` is not one of its levels.
    pub fn level(factor: &Factor, level: &str) -> Result<LevelSelector, DesignError> {
        if factor.level(level).is_none() {
            return Err(DesignError::InvalidLevelSelector {
                factor: factor.name().to_owned(),
                level: level.to_owned(),
            });
        }

        Ok(LevelSelector::Level {
            factor: factor.name().to_owned(),
            level: level.to_owned(),
        })
    }

    pub fn factor(&self) -> &str {
        match self {
            LevelSelector::Factor { factor, .. } | LevelSelector::Level { factor, .. } => factor,
        }
    }

    /// The selected levels, in level order.
    pub fn levels(&self) -> Vec<&str> {
        match self {
            LevelSelector::Factor { levels, .. } => levels.iter().map(String::as_str).collect(),
            LevelSelector::Level { level, .. } => vec![level.as_str()],
        }
    }

    /// One single-level selector per selected level.
    pub fn split(&self) -> Vec<LevelSelector> {
        self.levels()
            .into_iter()
            .map(|level| LevelSelector::Level {
                factor: self.factor().to_owned(),
                level: level.to_owned(),
            })
            .collect()
    }
}

impl From<&Factor> for LevelSelector {
    fn from(factor: &Factor) -> Self {
        LevelSelector::Factor {
            factor: factor.name().to_owned(),
            levels: factor
                .levels()
                .iter()
                .map(|level| level.name().to_owned())
                .collect(),
        }
    }
}

impl TryFrom<(&Factor, &str)> for LevelSelector {
    type Error = DesignError;

    fn try_from((factor, level): (&Factor, &str)) -> Result<Self, Self::Error> {
        LevelSelector::level(factor, level)
    }
}
