use chrono::NaiveDate;
use roam_shared::{TransportMode, TripType};

/// One line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Plain text edits the type-ahead query.
    Query(String),
    Pick(usize),
    From,
    To,
    Dates(NaiveDate, Option<NaiveDate>),
    Travelers(u32),
    Trip(TripType),
    Price(Option<f64>, Option<f64>),
    Mode(TransportMode),
    Search,
    Stay,
    StaysIn(String),
    City(String),
    Login(String),
    Logout,
    Show,
    Help,
    Quit,
}

pub const HELP: &str = "\
text                 edit the city query (suggestions appear after a pause)
:pick N              select suggestion N
:from | :to          use the current city as origin / destination
:date FROM [TO]      travel dates, YYYY-MM-DD
:travelers N         number of travelers
:trip oneway|roundtrip
:price MIN|- MAX|-   price bounds
:mode flights|buses|trains
:search              search transportation
:stay                search accommodation at the destination
:stays-in NAME       every stay listed for a city
:city NAME           city overview
:login TOKEN | :logout
:show | :help | :quit";

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| format!("invalid date: {}", raw))
}

fn parse_bound(raw: &str) -> Result<Option<f64>, String> {
    if raw == "-" {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| format!("invalid price: {}", raw))
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let Some(rest) = line.strip_prefix(':') else {
            return Ok(Command::Query(line.to_string()));
        };

        let mut parts = rest.split_whitespace();
        let name = parts.next().unwrap_or_default();
        let args: Vec<&str> = parts.collect();

        match (name, args.as_slice()) {
            ("pick", [n]) => n
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .map(Command::Pick)
                .ok_or_else(|| format!("invalid suggestion number: {}", n)),
            ("from", []) => Ok(Command::From),
            ("to", []) => Ok(Command::To),
            ("date", [from]) => Ok(Command::Dates(parse_date(from)?, None)),
            ("date", [from, to]) => Ok(Command::Dates(parse_date(from)?, Some(parse_date(to)?))),
            ("travelers", [n]) => n
                .parse::<u32>()
                .map(Command::Travelers)
                .map_err(|_| format!("invalid traveler count: {}", n)),
            ("trip", [kind]) => kind.parse::<TripType>().map(Command::Trip),
            ("price", [min, max]) => Ok(Command::Price(parse_bound(min)?, parse_bound(max)?)),
            ("mode", [mode]) => mode.parse::<TransportMode>().map(Command::Mode),
            ("search", []) => Ok(Command::Search),
            ("stay", []) => Ok(Command::Stay),
            ("stays-in", words) if !words.is_empty() => Ok(Command::StaysIn(words.join(" "))),
            ("city", words) if !words.is_empty() => Ok(Command::City(words.join(" "))),
            ("login", [token]) => Ok(Command::Login(token.to_string())),
            ("logout", []) => Ok(Command::Logout),
            ("show", []) => Ok(Command::Show),
            ("help", []) => Ok(Command::Help),
            ("quit", []) | ("q", []) => Ok(Command::Quit),
            _ => Err(format!("unknown command: {} (try :help)", line.trim())),
        }
    }
}
