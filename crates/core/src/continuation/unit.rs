//! Episode markers in campaign queries.

use regex_lite::Regex;

/// How the episode marker was written in the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitStyle {
    /// `S01E05`
    SeasonEpisode,
    /// `1x05`
    Cross,
}

/// An episode marker located inside a query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeUnit {
    pub season: u32,
    pub episode: u32,
    pub style: UnitStyle,
    /// Byte range of the marker within the query.
    start: usize,
    end: usize,
}

impl EpisodeUnit {
    /// Find the first episode marker in `query`.
    pub fn parse(query: &str) -> Option<Self> {
        parse_with(query, r"(?i)\bs(\d{1,2})\s*e(\d{1,3})\b", UnitStyle::SeasonEpisode)
            .or_else(|| parse_with(query, r"\b(\d{1,2})x(\d{2,3})\b", UnitStyle::Cross))
    }

    /// The marker for the following episode of the same season.
    pub fn next_episode(&self) -> Self {
        Self {
            episode: self.episode + 1,
            ..self.clone()
        }
    }

    /// The marker for the first episode of the following season.
    pub fn next_season(&self) -> Self {
        Self {
            season: self.season + 1,
            episode: 1,
            ..self.clone()
        }
    }

    pub fn marker(&self) -> String {
        match self.style {
            UnitStyle::SeasonEpisode => format!("S{:02}E{:02}", self.season, self.episode),
            UnitStyle::Cross => format!("{}x{:02}", self.season, self.episode),
        }
    }

    /// Rewrite `query` with this unit in place of the parsed marker.
    ///
    /// `query` must be the string this unit (or the unit it derives from) was
    /// parsed from.
    pub fn apply_to(&self, query: &str) -> String {
        format!("{}{}{}", &query[..self.start], self.marker(), &query[self.end..])
    }
}

fn parse_with(query: &str, pattern: &str, style: UnitStyle) -> Option<EpisodeUnit> {
    let re = Regex::new(pattern).ok()?;
    let caps = re.captures(query)?;
    let whole = caps.get(0)?;
    let season = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let episode = caps.get(2)?.as_str().parse::<u32>().ok()?;
    Some(EpisodeUnit {
        season,
        episode,
        style,
        start: whole.start(),
        end: whole.end(),
    })
}
