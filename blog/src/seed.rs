//! Initial content written on first start.
//!
//! Seed records are written through the repositories directly, so seeding
//! publishes no article events.

use chrono::{NaiveDate, NaiveDateTime};

use crate::blog::Blog;
use crate::error::{Error, Result};
use crate::model::{Article, User, slugify};

/// Writes the seed users and articles unless the store already holds users.
///
/// Returns `true` if the seed data was written.
pub async fn seed(blog: &Blog) -> Result<bool> {
    if blog.users().count().await? > 0 {
        tracing::info!("Store already contains users, skipping seed data");
        return Ok(false);
    }

    let users = seed_users();
    blog.users().save_all(&users).await?;
    let articles = seed_articles()?;
    blog.articles().save_all(&articles).await?;

    tracing::info!(
        users = users.len(),
        articles = articles.len(),
        "Wrote seed data"
    );
    Ok(true)
}

fn seed_users() -> Vec<User> {
    vec![
        User::new("bclozel", "Brian", "Clozel")
            .with_description("Spring Framework & Spring Boot @pivotal — @LaCordeeLyon coworker"),
        User::new("MkHeck", "Mark", "Heckler").with_description(
            "Spring Developer Advocate @Pivotal. Computer scientist+MBA, inglés y español, @Java_Champions. Pragmatic optimist. #Spring #Reactive #Microservices #IoT #Cloud",
        ),
        User::new("poutsma", "Arjen", "Poutsma"),
        User::new("rstoyanchev", "Rossen", "Stoyanchev")
            .with_description("Spring Framework committer @Pivotal"),
        User::new("sam_brannen", "Sam", "Brannen").with_description(
            "Core @SpringFramework & @JUnitTeam Committer. Enterprise @Java Consultant at @Swiftmind. #Spring Trainer. Spring User Group Lead at @JUGCH.",
        ),
        User::new("sdeleuze", "Sebastien", "Deleuze").with_description(
            "Spring Framework committer @Pivotal, @Kotlin addict, #WebAssembly believer, @mixitconf organizer, #techactivism",
        ),
        User::new("simonbasle", "Simon", "Basle")
            .with_description("software development aficionado, Reactor Software Engineer @pivotal"),
        User::new("smaldini", "Stephane", "Maldini").with_description(
            "Project Reactor Lead @Pivotal -All things Reactive and Distributed - ex Londoner - opinions != Pivotal",
        ),
        User::new("snicoll", "Stephane", "Nicoll").with_description(
            "Proud husband. Passionate and enthusiastic Software engineer. Working on @springboot, @springframework & Spring Initializr at @Pivotal",
        ),
        User::new("springjuergen", "Juergen", "Hoeller"),
        User::new("violetagg", "Violeta", "Georgieva").with_description("All views are my own!"),
    ]
}

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| Error::InvalidInput("invalid seed timestamp".to_string()))
}

fn article(
    title: &str,
    headline: &str,
    content: &str,
    author: &str,
    added_at: NaiveDateTime,
) -> Article {
    Article {
        slug: slugify(title),
        title: title.to_string(),
        headline: headline.to_string(),
        content: content.to_string(),
        author: author.to_string(),
        added_at,
    }
}

fn seed_articles() -> Result<Vec<Article>> {
    Ok(vec![
        article(
            "Reactor Bismuth is out",
            "It is my great pleasure to announce the GA release of **Reactor Bismuth**, which notably encompasses `reactor-core` **3.1.0.RELEASE** and `reactor-netty` **0.7.0.RELEASE** \u{1F389}",
            "With the release of [Spring Framework 5.0](https://spring.io/blog/2017/09/28/spring-framework-5-0-goes-ga) now just happening, you can imagine this is a giant step for Project Reactor :)\n",
            "simonbasle",
            at(2017, 9, 28, 12, 0)?,
        ),
        article(
            "Spring Framework 5.0 goes GA",
            "Dear Spring community,\n\nIt is my pleasure to announce that, after more than a year of milestones and RCs and almost two years of development overall, Spring Framework 5.0 is finally generally available as 5.0.0.RELEASE from [repo.spring.io](https://repo.spring.io) and Maven Central!",
            "This brand-new generation of the framework is ready for 2018 and beyond: with support for JDK 9 and the Java EE 8 API level (e.g. Servlet 4.0), as well as comprehensive integration with Reactor 3.1, JUnit 5, and the Kotlin language. On top of that all, Spring Framework 5 comes with many functional API variants and introduces a dedicated reactive web framework called Spring WebFlux, next to a revised version of our Servlet-based web framework Spring MVC.",
            "springjuergen",
            at(2017, 9, 28, 11, 30)?,
        ),
        article(
            "Introducing Kotlin support in Spring Framework 5.0",
            "Following the [Kotlin support on start.spring.io](https://spring.io/blog/2016/02/15/developing-spring-boot-applications-with-kotlin) we introduced a few months ago, we have continued to work to ensure that Spring and [Kotlin](https://kotlin.link/) play well together.",
            "One of the key strengths of Kotlin is that it provides a very good [interoperability](https://kotlinlang.org/docs/reference/java-interop.html) with libraries written in Java. But there are ways to go even further and allow writing fully idiomatic Kotlin code when developing your next Spring application. In addition to Spring Framework support for Java 8 that Kotlin applications can leverage like functional web or bean registration APIs, there are additional Kotlin dedicated features that should allow you to reach a new level of productivity.",
            "sdeleuze",
            at(2017, 1, 4, 9, 0)?,
        ),
    ])
}
