/// Shared memories and the month calendar built from them
///
/// A memory sits on its own date; an anniversary also comes back on the
/// same month and day every later year. A 29 February anniversary falls on
/// the 28th in common years.
use crate::{
    db::models::Memory,
    error::{LuneError, LuneResult},
};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Years the calendar accepts
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=9999;

/// One cell of the grid
#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub day: u32,
    pub date: NaiveDate,
    pub is_today: bool,
    pub memories: Vec<Memory>,
}

/// Weeks run Monday to Sunday; `None` pads days outside the month
#[derive(Debug, Clone, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<Option<CalendarDay>>>,
}

/// First day of the month and first day of the next one
pub fn month_bounds(year: i32, month: u32) -> LuneResult<(NaiveDate, NaiveDate)> {
    let invalid = || LuneError::Validation(format!("Invalid month: {}-{:02}", year, month));

    if !YEAR_RANGE.contains(&year) {
        return Err(invalid());
    }

    let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;

    Ok((start, end))
}

/// Day of `year`/`month` on which `memory` shows, if any
pub fn occurrence_day(memory: &Memory, year: i32, month: u32, days_in_month: u32) -> Option<u32> {
    let date = memory.date_memory;
    if date.month() != month {
        return None;
    }

    if date.year() == year {
        return Some(date.day());
    }

    if memory.is_anniversary && date.year() < year {
        return Some(date.day().min(days_in_month));
    }

    None
}

/// Lay out `year`/`month` with each memory on its day
pub fn month_grid(
    year: i32,
    month: u32,
    memories: &[Memory],
    today: NaiveDate,
) -> LuneResult<MonthGrid> {
    let (start, end) = month_bounds(year, month)?;
    let days_in_month = (end - start).num_days() as u32;
    let lead = start.weekday().num_days_from_monday() as usize;

    let mut cells: Vec<Option<CalendarDay>> = vec![None; lead];
    for date in start.iter_days().take(days_in_month as usize) {
        cells.push(Some(CalendarDay {
            day: date.day(),
            date,
            is_today: date == today,
            memories: Vec::new(),
        }));
    }

    for memory in memories {
        if let Some(day) = occurrence_day(memory, year, month, days_in_month) {
            if let Some(Some(cell)) = cells.get_mut(lead + day as usize - 1) {
                cell.memories.push(memory.clone());
            }
        }
    }

    while cells.len() % 7 != 0 {
        cells.push(None);
    }

    let weeks = cells.chunks(7).map(|week| week.to_vec()).collect();

    Ok(MonthGrid { year, month, weeks })
}
