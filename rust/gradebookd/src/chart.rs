use serde::Serialize;

use crate::calc::{self, SubjectBreakdown};

const BASE_PALETTE: [&str; 10] = [
    "#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40", "#8AC926", "#FF66A1",
    "#1982C4", "#6A4C93",
];

/// Golden-angle hue step for colours past the base palette.
const HUE_STEP: f64 = 137.5;
const GENERATED_SATURATION: u8 = 70;
const GENERATED_LIGHTNESS: u8 = 60;

const BREAKDOWN_COLORS: [&str; 4] = ["#42a5f5", "#66bb6a", "#ffa726", "#ef5350"];

const LINE_STROKE: &str = "rgba(75,192,192,1)";
const LINE_FILL: &str = "rgba(75,192,192,0.2)";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Color {
    Hex(&'static str),
    Hsl { hue: f64 },
}

impl Color {
    pub fn at(index: usize) -> Self {
        match BASE_PALETTE.get(index) {
            Some(hex) => Color::Hex(hex),
            None => Color::Hsl {
                hue: (index as f64 * HUE_STEP) % 360.0,
            },
        }
    }

    pub fn border(&self) -> String {
        match self {
            Color::Hex(hex) => hex.to_string(),
            Color::Hsl { hue } => format!(
                "hsl({}, {}%, {}%)",
                hue, GENERATED_SATURATION, GENERATED_LIGHTNESS
            ),
        }
    }

    /// Border colour at 80% alpha.
    pub fn background(&self) -> String {
        match self {
            Color::Hex(hex) => format!("{}CC", hex),
            Color::Hsl { hue } => format!(
                "hsla({}, {}%, {}%, 0.8)",
                hue, GENERATED_SATURATION, GENERATED_LIGHTNESS
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Palette {
    pub background_color: Vec<String>,
    pub border_color: Vec<String>,
}

pub fn palette(count: usize) -> Palette {
    let colors: Vec<Color> = (0..count).map(Color::at).collect();
    Palette {
        background_color: colors.iter().map(Color::background).collect(),
        border_color: colors.iter().map(Color::border).collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Pie,
    Doughnut,
    Bar,
    Line,
}

impl ChartKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pie" => Some(ChartKind::Pie),
            "doughnut" | "ring" => Some(ChartKind::Doughnut),
            "bar" => Some(ChartKind::Bar),
            "line" => Some(ChartKind::Line),
            _ => None,
        }
    }

    pub fn is_ring(self) -> bool {
        matches!(self, ChartKind::Pie | ChartKind::Doughnut)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColorSpec {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,
    pub background_color: ColorSpec,
    pub border_color: ColorSpec,
    pub border_width: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tension: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_background_color: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_border_color: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisHints {
    pub y_min: f64,
    pub y_max: f64,
    pub y_title: String,
    pub x_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub center_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub axes: Option<AxisHints>,
}

fn grade_axes() -> AxisHints {
    AxisHints {
        y_min: 0.0,
        y_max: 100.0,
        y_title: "Grade".to_string(),
        x_title: "Subject".to_string(),
    }
}

/// Shape `(label, value)` points for the given chart kind. `center` is the
/// summary value overlaid on ring/share charts; other kinds ignore it.
pub fn project(points: &[(String, f64)], kind: ChartKind, center: Option<f64>) -> ChartSpec {
    let labels: Vec<String> = points.iter().map(|(l, _)| l.clone()).collect();
    let data: Vec<f64> = points.iter().map(|(_, v)| *v).collect();
    let Palette {
        background_color,
        border_color,
    } = palette(points.len());

    let dataset = match kind {
        ChartKind::Pie | ChartKind::Doughnut | ChartKind::Bar => Dataset {
            label: None,
            data,
            background_color: ColorSpec::Many(background_color),
            border_color: ColorSpec::Many(border_color),
            border_width: 1,
            cutout: (kind == ChartKind::Doughnut).then(|| "70%".to_string()),
            tension: None,
            point_background_color: None,
            point_border_color: None,
        },
        ChartKind::Line => Dataset {
            label: None,
            data,
            background_color: ColorSpec::One(LINE_FILL.to_string()),
            border_color: ColorSpec::One(LINE_STROKE.to_string()),
            border_width: 2,
            cutout: None,
            tension: Some(0.3),
            point_background_color: Some(background_color),
            point_border_color: Some(border_color),
        },
    };

    ChartSpec {
        kind,
        labels,
        datasets: vec![dataset],
        center_text: center
            .filter(|_| kind.is_ring())
            .map(|v| format!("GWA: {}", calc::format_grade(v))),
        axes: (!kind.is_ring()).then(grade_axes),
    }
}

/// Four-category chart for one subject card.
pub fn breakdown_chart(breakdown: &SubjectBreakdown, kind: ChartKind) -> ChartSpec {
    let colors: Vec<String> = BREAKDOWN_COLORS.iter().map(|c| c.to_string()).collect();
    ChartSpec {
        kind,
        labels: breakdown
            .categories
            .iter()
            .map(|c| c.label.to_string())
            .collect(),
        datasets: vec![Dataset {
            label: Some(breakdown.subject.clone()),
            data: breakdown.categories.iter().map(|c| c.score).collect(),
            background_color: ColorSpec::Many(colors),
            border_color: ColorSpec::One("#333".to_string()),
            border_width: 1,
            cutout: None,
            tension: Some(0.4),
            point_background_color: None,
            point_border_color: None,
        }],
        center_text: None,
        axes: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Subject, SubjectId};
    use std::collections::HashSet;

    fn points(n: usize) -> Vec<(String, f64)> {
        (0..n).map(|i| (format!("S{}", i), i as f64)).collect()
    }

    #[test]
    fn small_palettes_use_base_colors_in_order() {
        let p = palette(10);
        assert_eq!(p.border_color, BASE_PALETTE.map(String::from).to_vec());
        assert_eq!(p.background_color[0], "#FF6384CC");
        assert_eq!(palette(3).border_color, vec!["#FF6384", "#36A2EB", "#FFCE56"]);
    }

    #[test]
    fn generated_colors_are_deterministic_per_index() {
        let a = palette(25);
        let b = palette(40);
        assert_eq!(a.border_color[..], b.border_color[..25]);
        assert_eq!(a.border_color[10], "hsl(295, 70%, 60%)");
        assert_eq!(a.background_color[11], "hsla(72.5, 70%, 60%, 0.8)");
    }

    #[test]
    fn generated_hues_are_distinct_up_to_fifty() {
        let hues: Vec<String> = (10..50)
            .map(|i| match Color::at(i) {
                Color::Hsl { hue } => hue.to_string(),
                Color::Hex(_) => panic!("expected generated color at {}", i),
            })
            .collect();
        let unique: HashSet<&String> = hues.iter().collect();
        assert_eq!(unique.len(), hues.len());
    }

    #[test]
    fn doughnut_carries_cutout_and_center_text() {
        let spec = project(&points(3), ChartKind::Doughnut, Some(88.755));
        assert_eq!(spec.datasets[0].cutout.as_deref(), Some("70%"));
        assert!(spec.center_text.as_deref().unwrap_or("").starts_with("GWA: "));
        assert!(spec.axes.is_none());
    }

    #[test]
    fn bar_and_line_ignore_center_value() {
        let bar = project(&points(2), ChartKind::Bar, Some(50.0));
        assert!(bar.center_text.is_none());
        assert_eq!(bar.axes.as_ref().map(|a| a.y_max), Some(100.0));

        let line = project(&points(2), ChartKind::Line, Some(50.0));
        assert!(line.center_text.is_none());
        assert_eq!(line.datasets[0].border_width, 2);
        assert_eq!(line.datasets[0].tension, Some(0.3));
        assert_eq!(
            line.datasets[0].point_border_color,
            Some(vec!["#FF6384".to_string(), "#36A2EB".to_string()])
        );
    }

    #[test]
    fn labels_keep_input_order() {
        let spec = project(&points(4), ChartKind::Pie, None);
        assert_eq!(spec.labels, vec!["S0", "S1", "S2", "S3"]);
        assert_eq!(spec.datasets[0].data, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn breakdown_chart_uses_fixed_category_colors() {
        let subject = Subject {
            id: SubjectId::new_v4(),
            subject: "Calculus".into(),
            code: "MATH101".into(),
            assignments: 90.0,
            quizzes: 85.0,
            projects: 88.0,
            exams: 92.0,
            feedback: String::new(),
        };
        let spec = breakdown_chart(&calc::subject_breakdown(&subject), ChartKind::Bar);
        assert_eq!(spec.labels, vec!["Assignments", "Quizzes", "Projects", "Exams"]);
        assert_eq!(spec.datasets[0].data, vec![90.0, 85.0, 88.0, 92.0]);
        assert_eq!(
            spec.datasets[0].background_color,
            ColorSpec::Many(BREAKDOWN_COLORS.map(String::from).to_vec())
        );
    }
}
