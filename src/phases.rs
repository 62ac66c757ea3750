use std::path::Path;

const NAME_SEPARATOR: char = '_';

/// Import phase of a data file, derived from its file name prefix.
///
/// Variants are declared in the order the server must receive them:
/// import descriptors first, then offers, stock levels and prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Import,
    Offers,
    Rests,
    Prices,
}

impl Phase {
    /// Classify an archive-relative path by the prefix of its file name
    /// up to the first underscore.
    pub fn of<P: AsRef<Path>>(path: P) -> Option<Phase> {
        let name = path.as_ref().file_name()?.to_str()?;
        let prefix = name.split(NAME_SEPARATOR).next()?;
        Phase::from_prefix(prefix)
    }

    pub fn from_prefix(prefix: &str) -> Option<Phase> {
        match prefix {
            "import" => Some(Phase::Import),
            "offers" => Some(Phase::Offers),
            "rests" => Some(Phase::Rests),
            "prices" => Some(Phase::Prices),
            _ => None,
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            Phase::Import => 1,
            Phase::Offers => 2,
            Phase::Rests => 3,
            Phase::Prices => 4,
        }
    }
}

/// Order data files by phase priority.
///
/// Files with an unknown prefix are left out. The sort is stable, so files
/// of the same phase keep the order they were given in.
pub fn sequence<S: AsRef<str>>(files: &[S]) -> Vec<String> {
    let mut phased: Vec<(u8, &str)> = files
        .iter()
        .filter_map(|name| {
            let name: &str = name.as_ref();
            let phase = Phase::of(name);
            if phase.is_none() {
                log::debug!("Skip {}: unknown phase", name);
            }
            phase.map(|phase| (phase.priority(), name))
        })
        .collect();

    phased.sort_by_key(|(priority, _)| *priority);
    phased
        .into_iter()
        .map(|(_, name)| name.to_owned())
        .collect()
}
