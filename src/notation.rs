//! Compact text notation for gases and waypoint lists.
//!
//! Gases: `air`, `oxygen`/`o2`, `ean32`/`nx32`/`nitrox32`, `tx18/45`,
//! `trimix18/45` or plain `18/45`, each optionally followed by `@DEPTH` to
//! override the maximum operating depth (`ean50@21`).
//!
//! Waypoints: `DEPTH[m] (@TIME | +DURATION) [GAS]`, separated by `;`, `,` or
//! newlines. `40 +20 air; 21 @30 ean50` holds 40m for 20 minutes on air and
//! then reaches 21m by minute 30 on EAN50.

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit1, multispace0, one_of, space0, space1},
    combinator::{map, map_res, opt, value},
    multi::separated_list1,
    number::complete::double,
    sequence::{preceded, terminated},
    IResult, Parser,
};

use crate::error::NotationError;
use crate::gas::Gas;
use crate::point::{Anchor, PlanPoint};

/// A parsed waypoint, ready to become a user [`PlanPoint`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub depth: f64,
    pub anchor: Anchor,
    pub gas: Option<Gas>,
}

impl<S> From<Waypoint> for PlanPoint<S> {
    fn from(waypoint: Waypoint) -> Self {
        let point = match waypoint.anchor {
            Anchor::Time(time) => PlanPoint::at_time(waypoint.depth, time),
            Anchor::Duration(duration) => PlanPoint::for_duration(waypoint.depth, duration),
        };
        match waypoint.gas {
            Some(gas) => point.with_gas(gas),
            None => point,
        }
    }
}

/// Parse a single gas, e.g. `ean32` or `tx18/45@60`.
pub fn parse_gas(input: &str) -> Result<Gas, NotationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(NotationError::EmptyInput);
    }
    finish(input, parse_gas_spec(input))?.build()
}

/// Parse a list of waypoints, e.g. `40 +20 air; 21 @30 ean50`.
pub fn parse_waypoints(input: &str) -> Result<Vec<Waypoint>, NotationError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(NotationError::EmptyInput);
    }
    let raw = finish(input, parse_waypoint_list(input))?;
    raw.into_iter()
        .map(|waypoint| {
            Ok(Waypoint {
                depth: waypoint.depth,
                anchor: waypoint.anchor,
                gas: waypoint.gas.map(GasSpec::build).transpose()?,
            })
        })
        .collect()
}

/// Turn a nom result into a value, rejecting trailing input.
fn finish<'a, O>(input: &'a str, result: IResult<&'a str, O>) -> Result<O, NotationError> {
    match result {
        Ok((remaining, output)) => {
            let remaining = remaining.trim();
            if remaining.is_empty() {
                Ok(output)
            } else {
                Err(NotationError::ParseError {
                    position: input.len() - remaining.len(),
                    message: format!("unexpected characters: '{}'", remaining),
                })
            }
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(NotationError::ParseError {
            position: input.len() - e.input.len(),
            message: format!("unexpected input: '{}'", e.input),
        }),
        Err(nom::Err::Incomplete(_)) => Err(NotationError::ParseError {
            position: input.len(),
            message: "unexpected end of input".to_string(),
        }),
    }
}

// ============================================================================
// Gas grammar
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Mix {
    Named(Gas),
    Percent(u32, u32),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct GasSpec {
    mix: Mix,
    mod_depth: Option<f64>,
}

impl GasSpec {
    fn build(self) -> Result<Gas, NotationError> {
        let gas = match self.mix {
            Mix::Named(gas) => gas,
            Mix::Percent(o2, he) => Gas::from_percent(o2, he)?,
        };
        Ok(match self.mod_depth {
            Some(depth) => gas.with_mod(depth),
            None => gas,
        })
    }
}

fn parse_gas_spec(input: &str) -> IResult<&str, GasSpec> {
    map(
        (parse_mix, opt(preceded(char('@'), parse_depth))),
        |(mix, mod_depth)| GasSpec { mix, mod_depth },
    )
    .parse(input)
}

fn parse_mix(input: &str) -> IResult<&str, Mix> {
    alt((
        value(Mix::Named(Gas::AIR), tag_no_case("air")),
        value(
            Mix::Named(Gas::OXYGEN),
            alt((tag_no_case("oxygen"), tag_no_case("o2"))),
        ),
        map(
            preceded(
                alt((tag_no_case("nitrox"), tag_no_case("ean"), tag_no_case("nx"))),
                parse_percent,
            ),
            |o2| Mix::Percent(o2, 0),
        ),
        map(
            preceded(
                opt(alt((tag_no_case("trimix"), tag_no_case("tx")))),
                (terminated(parse_percent, char('/')), parse_percent),
            ),
            |(o2, he)| Mix::Percent(o2, he),
        ),
    ))
    .parse(input)
}

fn parse_percent(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |digits: &str| digits.parse::<u32>()).parse(input)
}

// ============================================================================
// Waypoint grammar
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct RawWaypoint {
    depth: f64,
    anchor: Anchor,
    gas: Option<GasSpec>,
}

fn parse_waypoint_list(input: &str) -> IResult<&str, Vec<RawWaypoint>> {
    terminated(
        separated_list1(parse_separator, parse_waypoint),
        opt(parse_separator),
    )
    .parse(input)
}

fn parse_separator(input: &str) -> IResult<&str, char> {
    preceded(space0, terminated(one_of(";,\n"), multispace0)).parse(input)
}

fn parse_waypoint(input: &str) -> IResult<&str, RawWaypoint> {
    let (input, depth) = preceded(space0, parse_depth).parse(input)?;
    let (input, anchor) = preceded(space0, parse_anchor).parse(input)?;
    let (input, gas) = opt(preceded(space1, parse_gas_spec)).parse(input)?;
    Ok((input, RawWaypoint { depth, anchor, gas }))
}

fn parse_anchor(input: &str) -> IResult<&str, Anchor> {
    alt((
        map(preceded((char('@'), space0), parse_minutes), Anchor::Time),
        map(preceded((char('+'), space0), parse_minutes), Anchor::Duration),
    ))
    .parse(input)
}

fn parse_depth(input: &str) -> IResult<&str, f64> {
    terminated(double, opt(tag_no_case("m"))).parse(input)
}

fn parse_minutes(input: &str) -> IResult<&str, f64> {
    terminated(double, opt(tag_no_case("min"))).parse(input)
}
