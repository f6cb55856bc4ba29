/*
Parameter Automation
====================

An AudioParam is a base value plus a time-ordered list of automation events.
Times are absolute engine seconds.

  SetValue(t, v)    jump to v at t, hold afterwards
  LinearRamp(t, v)  arrive at v at t, sliding linearly from the previous
                    event's (time, value)

  value
    v2 ┤            ╱─────
       │          ╱
    v1 ┤─────────╱
       │
       └──────┬─────┬───→ time
             t1    t2
       SetValue(t1, v1)  LinearRamp(t2, v2)

Events with equal times keep their insertion order, so a stack of
zero-duration ramps collapses to the last one: at that instant the value is
already the final target.

`cancel_scheduled_values(t)` drops every event at or after `t`. Call it before
scheduling fresh automation so stale ramps cannot fight new ones.
*/

/// One scheduled automation point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamEvent {
    SetValue { time: f64, value: f32 },
    LinearRamp { time: f64, value: f32 },
}

impl ParamEvent {
    pub fn time(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { time, .. } | ParamEvent::LinearRamp { time, .. } => time,
        }
    }

    pub fn value(&self) -> f32 {
        match *self {
            ParamEvent::SetValue { value, .. } | ParamEvent::LinearRamp { value, .. } => value,
        }
    }
}

/// Automatable parameter with a Web-Audio-style timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioParam {
    base: f32,
    events: Vec<ParamEvent>,
}

impl AudioParam {
    pub fn new(value: f32) -> Self {
        Self {
            base: value,
            events: Vec::new(),
        }
    }

    /// Set the value immediately, discarding any automation.
    pub fn set_value(&mut self, value: f32) {
        self.base = value;
        self.events.clear();
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(ParamEvent::SetValue { time, value });
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, time: f64) {
        self.insert(ParamEvent::LinearRamp { time, value });
    }

    /// Remove every event scheduled at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) {
        self.events.retain(|e| e.time() < time);
    }

    pub fn events(&self) -> &[ParamEvent] {
        &self.events
    }

    /// Value the parameter takes at `time`.
    pub fn value_at(&self, time: f64) -> f32 {
        // index of the first event strictly after `time`
        let next = self.events.partition_point(|e| e.time() <= time);

        let (start_time, start_value) = match next.checked_sub(1) {
            Some(prev) => (self.events[prev].time(), self.events[prev].value()),
            None => (0.0, self.base),
        };

        match self.events.get(next) {
            Some(&ParamEvent::LinearRamp { time: end, value }) => {
                let span = end - start_time;
                if span <= 0.0 {
                    return value;
                }
                let progress = ((time - start_time) / span).clamp(0.0, 1.0) as f32;
                start_value + (value - start_value) * progress
            }
            _ => start_value,
        }
    }

    /// Drop history that can no longer influence values at or after `now`.
    ///
    /// The last event at or before `now` is kept because a ramp that is still
    /// in progress interpolates from it.
    pub fn compact(&mut self, now: f64) {
        let settled = self.events.partition_point(|e| e.time() <= now);
        if settled > 1 {
            self.events.drain(..settled - 1);
        }
    }

    fn insert(&mut self, event: ParamEvent) {
        let at = self.events.partition_point(|e| e.time() <= event.time());
        self.events.insert(at, event);
    }
}
