//! Patch operator table

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Row, Table},
    Frame,
};

use opn2_fm::{chip::Algorithm, synth::PatchParams};

const COLUMNS: [&str; 12] = [
    "OP", "TL", "AR", "DR", "SR", "SL", "RR", "MUL", "DT", "KS", "AM", "SSG",
];

/// Render the operator parameters of the current patch
pub fn render_operators(frame: &mut Frame, area: Rect, patch: &PatchParams) {
    let algorithm = Algorithm::new(patch.global.algorithm);
    let title = format!(
        " Alg {} ({})  FB {} ",
        algorithm.id(),
        algorithm.name(),
        patch.global.feedback
    );

    let header = Row::new(COLUMNS).style(Style::default().add_modifier(Modifier::BOLD));

    let rows = patch.operators.iter().enumerate().map(|(i, op)| {
        let carrier = algorithm.is_carrier(i);
        let ssg = if op.ssg_enabled {
            op.ssg_mode.to_string()
        } else {
            "-".to_string()
        };
        let cells = [
            format!("{}{}", i + 1, if carrier { "*" } else { "" }),
            op.total_level.to_string(),
            op.attack_rate.to_string(),
            op.decay_rate.to_string(),
            op.sustain_rate.to_string(),
            op.sustain_level.to_string(),
            op.release_rate.to_string(),
            op.multiple.to_string(),
            op.detune.to_string(),
            op.key_scale.to_string(),
            if op.am_enabled { "on" } else { "-" }.to_string(),
            ssg,
        ];
        let colour = if carrier { Color::Cyan } else { Color::Gray };
        Row::new(cells).style(Style::default().fg(colour))
    });

    let widths = [Constraint::Length(4); COLUMNS.len()];
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().title(title).borders(Borders::ALL));

    frame.render_widget(table, area);
}
