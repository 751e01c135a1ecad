//! Scroll routine evaluated inside the page to force lazy content to render.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollSpeed {
    Slow,
    Fast,
}

#[derive(Debug, Clone, Copy)]
pub struct ScrollOptions {
    pub direction: ScrollDirection,
    pub speed: ScrollSpeed,
    pub step_px: u32,
    pub delay_slow_ms: u64,
    pub delay_fast_ms: u64,
    pub max_iterations: u32,
}

impl Default for ScrollOptions {
    fn default() -> Self {
        ScrollOptions {
            direction: ScrollDirection::Down,
            speed: ScrollSpeed::Fast,
            step_px: 100,
            delay_slow_ms: 150,
            delay_fast_ms: 10,
            max_iterations: 2000,
        }
    }
}

impl ScrollOptions {
    pub fn delay_ms(&self) -> u64 {
        match self.speed {
            ScrollSpeed::Slow => self.delay_slow_ms,
            ScrollSpeed::Fast => self.delay_fast_ms,
        }
    }
}

/// Builds the routine the browser runs in the page context. The position
/// moves in fixed steps from one boundary toward the other while the scroll
/// extent is re-read every tick, since lazy loading keeps growing it. The
/// loop can only finish on its own if the page grows slower than one step
/// per tick; `max_iterations` bounds it on pages that never stop growing.
/// The promise resolves once either condition is hit, so a DOM query made
/// after the evaluation returns sees fully materialized content.
pub fn scroll_script(opts: &ScrollOptions) -> String {
    let (start, increment, past_end) = match opts.direction {
        ScrollDirection::Down => ("0", opts.step_px as i64, "position > extent"),
        ScrollDirection::Up => (
            "document.body.scrollHeight",
            -(opts.step_px as i64),
            "position < 0",
        ),
    };
    format!(
        r#"new Promise((resolve) => {{
            var position = {start};
            var iterations = 0;
            var timer = setInterval(() => {{
                var extent = document.body.scrollHeight;
                window.scrollTo(0, position);
                position += {increment};
                iterations += 1;
                if ({past_end} || iterations >= {max}) {{
                    clearInterval(timer);
                    resolve(iterations);
                }}
            }}, {delay});
        }})"#,
        start = start,
        increment = increment,
        past_end = past_end,
        max = opts.max_iterations,
        delay = opts.delay_ms(),
    )
}
