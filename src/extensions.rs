//! Built-in extensions.
//!
//! Determinate progress: [`Percentage`], [`Bar`], [`Rate`], [`Timer`],
//! [`Eta`], [`EtaNew`]. Indeterminate progress: [`BouncingBar`],
//! [`Ellipses`], [`Alternator`].

use std::{fmt::Write as _, time::Duration};

use compact_str::{CompactString, format_compact};

use crate::{extension::Extension, stats::Params, tag::Tag};

static NO_REQUIREMENTS: [Tag; 0] = [];
static PERCENTAGE: [Tag; 1] = [Tag::PERCENTAGE];
static TIME_SINCE_BEGIN: [Tag; 1] = [Tag::TIME_SINCE_BEGIN];
static ETA: [Tag; 1] = [Tag::ETA];
static ETA_NEW: [Tag; 1] = [Tag::ETA_NEW];
static RATE: [Tag; 1] = [Tag::RATE];
static BOUNCING: [Tag; 2] = [Tag::TIME_SINCE_BEGIN, Tag::DELTATIME];

const INDETERMINATE_INTERVAL: Duration = Duration::from_millis(300);

/// Formats whole seconds as `H:MM:SS`, prefixed with `N day(s), ` past a day.
#[must_use]
pub fn format_hms(duration: Duration) -> CompactString {
    let total = duration.as_secs();
    let (days, rest) = (total / 86_400, total % 86_400);
    let (hours, minutes, seconds) = (rest / 3600, rest % 3600 / 60, rest % 60);

    let mut out = CompactString::default();
    if days > 0 {
        let plural = if days == 1 { "" } else { "s" };
        let _ = write!(out, "{days} day{plural}, ");
    }
    let _ = write!(out, "{hours}:{minutes:02}:{seconds:02}");
    out
}

/// Completion as a zero padded integer percentage, e.g. `07%`.
#[derive(Debug, Default)]
pub struct Percentage;

impl Percentage {
    /// Creates the extension.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Extension for Percentage {
    fn requirements(&self) -> &[Tag] {
        &PERCENTAGE
    }

    fn on_validated(&mut self, params: &Params<'_>, output: &mut CompactString) {
        if let Some(percentage) = params.number(0) {
            *output = format_compact!("{:02}%", percentage as i64);
        }
    }
}

/// A fixed-width bar filled proportionally to the percentage.
#[derive(Debug)]
pub struct Bar {
    length: usize,
    begin: char,
    filler: char,
    empty: char,
    end: char,
}

impl Default for Bar {
    fn default() -> Self {
        Self {
            length: 60,
            begin: '[',
            filler: '#',
            empty: ' ',
            end: ']',
        }
    }
}

impl Bar {
    /// A 60 cell `[###   ]` bar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of cells between the delimiters.
    #[must_use]
    pub const fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Sets the delimiters and the filled and empty cell characters.
    #[must_use]
    pub const fn with_entities(mut self, begin: char, filler: char, empty: char, end: char) -> Self {
        self.begin = begin;
        self.filler = filler;
        self.empty = empty;
        self.end = end;
        self
    }

    fn filled(&self, percentage: f64) -> usize {
        let cells = (percentage * self.length as f64 / 100.0).floor();
        if cells.is_nan() || cells < 0.0 {
            0
        } else {
            (cells as usize).min(self.length)
        }
    }

    fn draw(&self, filled: usize) -> CompactString {
        let mut bar = CompactString::with_capacity(self.length + 2);
        bar.push(self.begin);
        bar.extend(std::iter::repeat_n(self.filler, filled));
        bar.extend(std::iter::repeat_n(self.empty, self.length - filled));
        bar.push(self.end);
        bar
    }
}

impl Extension for Bar {
    fn requirements(&self) -> &[Tag] {
        &PERCENTAGE
    }

    fn on_validated(&mut self, params: &Params<'_>, output: &mut CompactString) {
        if let Some(percentage) = params.number(0) {
            *output = self.draw(self.filled(percentage));
        }
    }

    // Keep the last drawn bar.
    fn on_invalidated(&mut self, _params: &Params<'_>, output: &mut CompactString) {
        if output.is_empty() {
            *output = self.draw(0);
        }
    }
}

/// A marker bouncing between the ends of a bar, for indeterminate progress.
#[derive(Debug)]
pub struct BouncingBar {
    bar: Bar,
    velocity: f64,
    position: f64,
}

impl Default for BouncingBar {
    fn default() -> Self {
        Self {
            bar: Bar::default().with_entities('[', '*', ' ', ']'),
            velocity: 200.0,
            position: 0.0,
        }
    }
}

impl BouncingBar {
    /// A 60 cell bar whose marker moves 200 cells per second.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of cells.
    #[must_use]
    pub fn with_length(mut self, length: usize) -> Self {
        self.bar = self.bar.with_length(length);
        self
    }

    /// Sets the marker speed in cells per second.
    #[must_use]
    pub const fn with_velocity(mut self, velocity: f64) -> Self {
        self.velocity = velocity;
        self
    }

    fn last_cell(&self) -> f64 {
        self.bar.length.saturating_sub(1) as f64
    }

    fn advance(&mut self, delta: Duration) {
        let last = self.last_cell();
        self.position += self.velocity * delta.as_secs_f64();
        if self.position >= last {
            self.position = last;
            self.velocity = -self.velocity.abs();
        } else if self.position <= 0.0 {
            self.position = 0.0;
            self.velocity = self.velocity.abs();
        }
    }

    fn draw(&self) -> CompactString {
        let length = self.bar.length;
        let marker = (self.position as usize).min(length.saturating_sub(1));
        let mut bar = CompactString::with_capacity(length + 2);
        bar.push(self.bar.begin);
        for cell in 0..length {
            bar.push(if cell == marker { self.bar.filler } else { self.bar.empty });
        }
        bar.push(self.bar.end);
        bar
    }
}

impl Extension for BouncingBar {
    fn requirements(&self) -> &[Tag] {
        &BOUNCING
    }

    fn update_interval(&self) -> Option<Duration> {
        Some(Duration::from_millis(100))
    }

    fn on_validated(&mut self, params: &Params<'_>, output: &mut CompactString) {
        if let Some(delta) = params.duration(1) {
            self.advance(delta);
        }
        *output = self.draw();
    }

    fn on_invalidated(&mut self, _params: &Params<'_>, output: &mut CompactString) {
        *output = self.draw();
    }

    fn on_end(&mut self, _params: &Params<'_>, output: &mut CompactString) {
        self.position = self.last_cell();
        *output = self.draw();
    }
}

/// Renders a duration tag as `H:MM:SS`.
#[derive(Debug)]
pub struct Timer {
    requirements: &'static [Tag],
}

impl Default for Timer {
    fn default() -> Self {
        Self {
            requirements: &TIME_SINCE_BEGIN,
        }
    }
}

impl Timer {
    /// Time elapsed since the session began.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Extension for Timer {
    fn requirements(&self) -> &[Tag] {
        self.requirements
    }

    fn on_validated(&mut self, params: &Params<'_>, output: &mut CompactString) {
        if let Some(duration) = params.duration(0) {
            *output = format_hms(duration);
        }
    }
}

/// Estimated time left, from the `eta` provider.
#[derive(Debug)]
pub struct Eta(Timer);

impl Default for Eta {
    fn default() -> Self {
        Self(Timer { requirements: &ETA })
    }
}

impl Eta {
    /// Creates the extension.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Extension for Eta {
    fn requirements(&self) -> &[Tag] {
        self.0.requirements()
    }

    fn on_validated(&mut self, params: &Params<'_>, output: &mut CompactString) {
        self.0.on_validated(params, output);
    }
}

/// Estimated time left, from the rate-based `eta_new` provider.
#[derive(Debug)]
pub struct EtaNew(Timer);

impl Default for EtaNew {
    fn default() -> Self {
        Self(Timer {
            requirements: &ETA_NEW,
        })
    }
}

impl EtaNew {
    /// Creates the extension.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Extension for EtaNew {
    fn requirements(&self) -> &[Tag] {
        self.0.requirements()
    }

    fn on_validated(&mut self, params: &Params<'_>, output: &mut CompactString) {
        self.0.on_validated(params, output);
    }
}

/// Publish rate as `N iters/s`.
#[derive(Debug, Default)]
pub struct Rate;

impl Rate {
    /// Creates the extension.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Extension for Rate {
    fn requirements(&self) -> &[Tag] {
        &RATE
    }

    fn on_validated(&mut self, params: &Params<'_>, output: &mut CompactString) {
        if let Some(rate) = params.number(0) {
            *output = format_compact!("{} iters/s", rate as i64);
        }
    }
}

/// Up to three dots, one more on every refresh.
#[derive(Debug, Default)]
pub struct Ellipses {
    count: usize,
}

impl Ellipses {
    const MAX: usize = 3;

    /// Creates the extension.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Extension for Ellipses {
    fn requirements(&self) -> &[Tag] {
        &NO_REQUIREMENTS
    }

    fn update_interval(&self) -> Option<Duration> {
        Some(INDETERMINATE_INTERVAL)
    }

    fn on_validated(&mut self, _params: &Params<'_>, output: &mut CompactString) {
        self.count = (self.count + 1) % (Self::MAX + 1);
        *output = ".".repeat(self.count).into();
    }

    fn on_end(&mut self, _params: &Params<'_>, output: &mut CompactString) {
        *output = format_compact!("{}Done", ".".repeat(Self::MAX));
    }
}

/// Cycles through a fixed list of frames, one per refresh.
#[derive(Debug)]
pub struct Alternator {
    frames: Vec<CompactString>,
    next: usize,
}

impl Alternator {
    /// Cycles through `frames`.
    pub fn new<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        Self {
            frames: frames.into_iter().map(Into::into).collect(),
            next: 0,
        }
    }

    /// The classic `\ | / -` spinner.
    #[must_use]
    pub fn spinner() -> Self {
        Self::new(["\\", "|", "/", "-"])
    }

    /// Grows `ch` from zero to `n` repetitions, then starts over.
    #[must_use]
    pub fn loader(ch: char, n: usize) -> Self {
        Self::new((0..=n).map(|i| std::iter::repeat_n(ch, i).collect::<CompactString>()))
    }
}

impl Extension for Alternator {
    fn requirements(&self) -> &[Tag] {
        &NO_REQUIREMENTS
    }

    fn update_interval(&self) -> Option<Duration> {
        Some(INDETERMINATE_INTERVAL)
    }

    fn on_validated(&mut self, _params: &Params<'_>, output: &mut CompactString) {
        let Some(frame) = self.frames.get(self.next) else {
            return;
        };
        output.clone_from(frame);
        self.next = (self.next + 1) % self.frames.len();
    }
}
