//! Terminal output

use chrono::{DateTime, Local, Utc};
use uniportal_appointments::{Appointment, AppointmentStatus};
use uniportal_auth::UserProfile;
use uniportal_chat::{PollVoting, RoomSnapshot};
use uniportal_store::{ChatMessage, MessageBody, QnaQuestion, QnaReply};

fn local(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub fn profile(profile: &UserProfile) {
    println!("👤 {} ({}) <{}>", profile.name, profile.role, profile.email);
    if !profile.is_staff() {
        println!(
            "   {} / {} / Batch {}",
            profile.faculty, profile.degree_program, profile.batch_number
        );
    }
    println!("   uid: {}", profile.uid);
}

pub fn message(message: &ChatMessage, viewer_uid: &str) {
    let who = if message.sender_id == viewer_uid {
        "You".to_string()
    } else {
        message.sender_name.clone()
    };
    let reactions = match message.reaction_count() {
        0 => String::new(),
        n => format!("  ❤ {}", n),
    };

    if let Some(quoted) = &message.reply_to {
        println!("    ↪ {}: {}", quoted.name, quoted.text);
    }

    match &message.body {
        MessageBody::Text => {
            println!(
                "[{}] {}: {}{}  ({})",
                local(message.sent_at),
                who,
                message.text,
                reactions,
                message.id
            );
            if let Some(url) = &message.image_url {
                println!("    🖼  {}", url);
            }
        }
        MessageBody::Poll(poll) => {
            let kind = if poll.allow_multiple { "multi" } else { "single" };
            println!(
                "[{}] {} 📊 {} [{}]{}  ({})",
                local(message.sent_at),
                who,
                poll.question,
                kind,
                reactions,
                message.id
            );
            let mine = poll.choices_of(viewer_uid);
            for (index, tally) in poll.tally().iter().enumerate() {
                let marker = if mine.contains(&index) { "●" } else { "○" };
                println!(
                    "    {} {}. {} - {} vote(s), {:.0}%",
                    marker, index, tally.option, tally.votes, tally.percent
                );
            }
        }
        MessageBody::Announcement(announcement) => {
            let expiry = announcement
                .expires_at
                .map(|at| format!("until {}", local(at)))
                .unwrap_or_else(|| "no expiry".to_string());
            println!(
                "[{}] {} 📢 {} ({}){}  ({})",
                local(message.sent_at),
                who,
                announcement.title,
                expiry,
                reactions,
                message.id
            );
            println!("    {}", announcement.body);
        }
    }
}

pub fn snapshot(snapshot: &RoomSnapshot, viewer_uid: &str) {
    println!("💬 {} ({} messages)", snapshot.title, snapshot.messages.len());
    for message in snapshot.messages.iter() {
        self::message(message, viewer_uid);
    }
    footer(snapshot);
}

pub fn footer(snapshot: &RoomSnapshot) {
    if let Some(mention) = &snapshot.unseen_mention {
        println!("🔔 {} mentioned you: {}", mention.sender_name, mention.text);
    }
    if snapshot.unread > 0 {
        println!("📬 {} unread", snapshot.unread);
    }
}

pub fn question(question: &QnaQuestion) {
    println!(
        "❓ {} - {}  👍 {}  ({}, {})",
        question.author_name,
        question.text,
        question.thumbs_up(),
        local(question.created_at),
        question.id
    );
}

pub fn reply(reply: &QnaReply) {
    println!(
        "    ↪ {} - {}  👍 {}  ({})",
        reply.author_name,
        reply.text,
        reply.thumbs_up(),
        reply.id
    );
}

pub fn appointment(appointment: &Appointment) {
    let icon = match appointment.status {
        AppointmentStatus::Pending => "⏳",
        AppointmentStatus::Approved => "✅",
        AppointmentStatus::Rejected => "❌",
    };
    println!(
        "{} {} {} {} with {} for {} ({})",
        icon,
        appointment.status,
        appointment.date,
        appointment.time,
        appointment.lecturer_name,
        appointment.student_name,
        appointment.id
    );
    println!("    {}: {}", appointment.module, appointment.reason);
    if let Some(reply) = &appointment.reply {
        println!("    Reply: {}", reply);
    }
}
